use anyhow::Context;
use log::{info, LevelFilter};
use serde::{Deserialize, Serialize};
use simplelog::{ConfigBuilder, SimpleLogger};

#[derive(Serialize, Deserialize, PartialEq, Debug)]
enum Species {
    PrionailurusViverrinus,
    LynxLynx,
    FelisCatus,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct Cat<'a> {
    name: &'a str,
    species: Species,
    chip: Option<u64>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct Message<'a> {
    version: u32,
    #[serde(borrow)]
    cats: Vec<Cat<'a>>,
    #[serde(with = "serde_bytes")]
    checksum: &'a [u8],
}

fn main() -> anyhow::Result<()> {
    let config = ConfigBuilder::new().set_location_level(LevelFilter::Error).build();
    SimpleLogger::init(LevelFilter::Debug, config)?;

    let msg = Message {
        version: 1,
        cats: vec![
            Cat { name: "Jessica", species: Species::PrionailurusViverrinus, chip: Some(276098100231337) },
            Cat { name: "Wantan", species: Species::LynxLynx, chip: None },
            Cat { name: "Sphinx", species: Species::FelisCatus, chip: None },
            Cat { name: "Chandra", species: Species::PrionailurusViverrinus, chip: Some(276098100004711) },
        ],
        checksum: &[0xde, 0xad, 0xbe, 0xef],
    };

    let bytes = bencode_serde::to_bytes(&msg).context("serializing message")?;
    info!("bencode: {} bytes", bytes.len());
    println!("{}", String::from_utf8_lossy(&bytes));

    let value = bencode::parse(&bytes[..]).context("decoding as value")?;
    println!("{}", value);

    let back: Message = bencode_serde::from_bytes(&bytes).context("deserializing message")?;
    anyhow::ensure!(back == msg, "message changed in transit");

    let json = serde_json::to_vec(&msg)?;
    info!("json: {} bytes, bencode: {} bytes", json.len(), bytes.len());
    Ok(())
}
