//! Command-line probe over a Conatho document.
//!
//! # Responsibility
//! - Drive the core document API without the desktop UI.
//! - Keep output line-oriented and deterministic for scripting.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use conatho_core::{
    default_log_level, init_logging, AttributeValue, Datatype, Document, EntityId,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Inspect and edit Conatho documents", long_about = None)]
struct Args {
    /// Document file; created when missing.
    document: PathBuf,
    /// Absolute directory for rolling log files. Logging is off without it.
    #[clap(long)]
    log_dir: Option<PathBuf>,
    /// trace|debug|info|warn|error
    #[clap(long)]
    log_level: Option<String>,
    #[clap(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print entity, connection and attribute type counts (default).
    Summary,
    /// List entities with their connections.
    List,
    /// Create an entity.
    AddEntity {
        name: String,
        #[clap(long, default_value_t = 0, allow_hyphen_values = true)]
        x: i32,
        #[clap(long, default_value_t = 0, allow_hyphen_values = true)]
        y: i32,
    },
    /// Connect a superior entity to an inferior entity.
    Connect {
        superior: EntityId,
        inferior: EntityId,
        #[clap(long, default_value = "")]
        name: String,
    },
    /// Delete an entity and every connection touching it.
    DeleteEntity { entity: EntityId },
    /// Create a document-wide attribute type.
    AddType { name: String, datatype: DatatypeArg },
    /// Add an attribute to an entity and optionally set its value.
    SetAttribute {
        entity: EntityId,
        type_id: i64,
        value: Option<String>,
    },
    /// Attach an image file to an entity.
    AttachImage { entity: EntityId, file: PathBuf },
    /// Write an entity's stored thumbnail (QOI) to a file.
    ExportThumbnail { entity: EntityId, file: PathBuf },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum DatatypeArg {
    Number,
    String,
    Data,
}

impl From<DatatypeArg> for Datatype {
    fn from(value: DatatypeArg) -> Self {
        match value {
            DatatypeArg::Number => Datatype::Number,
            DatatypeArg::String => Datatype::String,
            DatatypeArg::Data => Datatype::Data,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(log_dir) = &args.log_dir {
        let level = args
            .log_level
            .clone()
            .unwrap_or_else(|| default_log_level().as_str().to_string());
        init_logging(&level, log_dir)
            .map_err(|err| anyhow::anyhow!("could not start logging: {err}"))?;
    }

    let mut document = Document::load(&args.document)
        .with_context(|| format!("could not open {}", args.document.display()))?;

    match args.cmd.unwrap_or(Command::Summary) {
        Command::Summary => {
            println!("entities={}", document.entity_count());
            println!("connections={}", document.connection_count());
            println!("attribute_types={}", document.attribute_types().count());
        }
        Command::List => list(&document)?,
        Command::AddEntity { name, x, y } => {
            let id = document.create_entity(x, y, name)?;
            println!("{id}");
        }
        Command::Connect {
            superior,
            inferior,
            name,
        } => {
            let id = document.connect(superior, inferior, name)?;
            println!("{id}");
        }
        Command::DeleteEntity { entity } => document.delete_entity(entity)?,
        Command::AddType { name, datatype } => {
            let id = document.add_attribute_type(name, datatype.into())?;
            println!("{id}");
        }
        Command::SetAttribute {
            entity,
            type_id,
            value,
        } => {
            let datatype = match document.attribute_type(type_id) {
                Some(kind) => kind.datatype,
                None => bail!("unknown attribute type {type_id}"),
            };
            let id = document.add_attribute(entity, type_id)?;
            if let Some(raw) = value {
                document.update_attribute(entity, id, parse_value(datatype, raw)?)?;
            }
            println!("{id}");
        }
        Command::AttachImage { entity, file } => {
            let raw = std::fs::read(&file)
                .with_context(|| format!("could not read {}", file.display()))?;
            document.attach_image(entity, &raw)?;
        }
        Command::ExportThumbnail { entity, file } => {
            let thumbnail = document.fetch_thumbnail(entity)?;
            std::fs::write(&file, thumbnail)
                .with_context(|| format!("could not write {}", file.display()))?;
        }
    }

    document.close()?;
    Ok(())
}

fn list(document: &Document) -> Result<()> {
    for entity in document.entities() {
        println!(
            "{} ({}, {}) image={} {}",
            entity.id, entity.x, entity.y, entity.has_image, entity.name
        );
        for connection in document.connections_of(entity.id) {
            let arrow = if connection.superior == entity.id {
                format!("-> {}", connection.inferior)
            } else {
                format!("<- {}", connection.superior)
            };
            println!("    {arrow} {}", connection.name);
        }
        for attribute in document.attributes(entity.id)? {
            println!("    {} = {:?}", attribute.name, attribute.value_or_zero());
        }
    }
    Ok(())
}

fn parse_value(datatype: Datatype, raw: String) -> Result<AttributeValue> {
    Ok(match datatype {
        Datatype::Number => AttributeValue::Number(
            raw.trim()
                .parse()
                .with_context(|| format!("`{raw}` is not a number"))?,
        ),
        Datatype::String => AttributeValue::Text(raw),
        Datatype::Data => AttributeValue::Bytes(raw.into_bytes()),
    })
}

#[cfg(test)]
mod tests {
    use super::{parse_value, Args};
    use clap::Parser;
    use conatho_core::{AttributeValue, Datatype};

    #[test]
    fn numbers_are_parsed_and_validated() {
        assert_eq!(
            parse_value(Datatype::Number, " 42 ".to_string()).unwrap(),
            AttributeValue::Number(42)
        );
        assert!(parse_value(Datatype::Number, "many".to_string()).is_err());
        assert_eq!(
            parse_value(Datatype::Data, "ab".to_string()).unwrap(),
            AttributeValue::Bytes(vec![b'a', b'b'])
        );
    }

    #[test]
    fn arguments_parse_negative_positions() {
        let args = Args::try_parse_from([
            "conatho", "doc.conatho", "add-entity", "Acme", "--x", "-5", "--y", "7",
        ])
        .unwrap();
        assert!(args.cmd.is_some());
    }
}
