use colored::Colorize;
use env_logger::Env;
use log::{error, info, warn};
use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Only the catalog store is used here; the game modules belong to `truckcatalog`.
#[allow(dead_code)]
mod libcatalog;
use crate::libcatalog::db;
use crate::libcatalog::db::{Attribution, ContentBlock, Manufacturer, TruckModel};
use crate::libcatalog::slug::slugify;

#[derive(Parser, Debug)]
#[command(name = "catalog-io")]
#[command(version, about = "Imports and exports the truck catalog as JSON", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, default_value = "info")]
    log_level: String,
    #[arg(short, long, value_name = "FILE", default_value = "trucks.db")]
    db: PathBuf,

    json: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Import,
    Export,
}

#[derive(Debug, Error)]
enum Error {
    #[error("cannot access the database: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("cannot read or write the JSON file: {0}")]
    Io(#[from] io::Error),
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
struct CatalogJson {
    manufacturers: Vec<ManufacturerJson>,
}
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct ManufacturerJson {
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    logo: Option<String>,
    #[serde(default)]
    models: Vec<ModelJson>,
}
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct ModelJson {
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    year_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    model3d: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    model3d_attribution: Option<Attribution>,
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Default, PartialEq)]
struct ImportReport {
    manufacturers: usize,
    models: usize,
    skipped: usize,
}

fn main() {
    let args = Args::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(args.log_level)).init();

    info!(
        "{}",
        format!("File at {:?} and Database at {:?}", args.json, args.db).cyan()
    );
    let db = match db::create_or_open(&args.db) {
        Ok(d) => d,
        Err(e) => {
            error!("{}{}", "Unable to open Database: ".red(), e);
            std::process::exit(1);
        }
    };

    let result = match args.command {
        Commands::Import => read_catalog(&args.json).and_then(|content| {
            let report = import_catalog(&db, &content)?;
            info!(
                "{}",
                format!(
                    "Imported {} Manufacturers and {} Models ({} skipped).",
                    report.manufacturers, report.models, report.skipped
                )
                .blue()
            );
            Ok(())
        }),
        Commands::Export => export_catalog(&db).and_then(|content| {
            let json = serde_json::to_string_pretty(&content)?;
            std::fs::write(&args.json, json)?;
            info!(
                "{}",
                format!(
                    "Exported {} Manufacturers to {:?}.",
                    content.manufacturers.len(),
                    args.json
                )
                .blue()
            );
            Ok(())
        }),
    };

    let closed = db::close_db(db);
    if let Err(e) = result {
        error!("{}", e.to_string().red());
        std::process::exit(1);
    }
    if let Err(e) = closed {
        error!("{}", format!("Failed to close Database: {}", e).red());
        std::process::exit(1);
    }
}

fn read_catalog(path: &Path) -> Result<CatalogJson, Error> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(json.as_str())?)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Imports everything in one transaction; any database error rolls the whole
/// file back.
fn import_catalog(conn: &Connection, content: &CatalogJson) -> Result<ImportReport, Error> {
    let tx = conn.unchecked_transaction()?;
    let report = import_manufacturers(&tx, content)?;
    tx.commit()?;
    Ok(report)
}

fn import_manufacturers(conn: &Connection, content: &CatalogJson) -> Result<ImportReport, Error> {
    let mut report = ImportReport::default();
    info!(
        "{}",
        format!("Importing data... ({} Manufacturers)", content.manufacturers.len()).blue()
    );

    for manufacturer in &content.manufacturers {
        let Some(name) = non_empty(&manufacturer.name) else {
            error!(
                "{}",
                format!("├ ✘ Manufacturer without a `name` ({} Models)", manufacturer.models.len())
                    .red()
                    .strikethrough()
            );
            report.skipped += 1 + manufacturer.models.len();
            continue;
        };
        let slug = non_empty(&manufacturer.slug)
            .map(str::to_string)
            .unwrap_or_else(|| slugify(name));
        if slug.is_empty() {
            error!(
                "{}",
                format!("├ ✘ Manufacturer: {} (cannot derive a slug)", name).red().strikethrough()
            );
            report.skipped += 1 + manufacturer.models.len();
            continue;
        }
        info!(
            "{}",
            format!("├ Manufacturer: {} /{} ({} Models)", name, slug, manufacturer.models.len()).blue()
        );

        let manufacturer_id = match Manufacturer::get_by_slug(conn, &slug)? {
            Some(existing) => match existing.id {
                Some(id) => id,
                None => {
                    warn!("│ Manufacturer {} has no id, skipping", slug);
                    report.skipped += 1 + manufacturer.models.len();
                    continue;
                }
            },
            None => {
                report.manufacturers += 1;
                Manufacturer::add(
                    conn,
                    Manufacturer {
                        id: None,
                        name: name.to_string(),
                        slug: slug.clone(),
                        logo: manufacturer.logo.clone(),
                    },
                )?
            }
        };

        for model in &manufacturer.models {
            let Some(title) = non_empty(&model.title) else {
                error!(
                    "{} {}",
                    "│".blue(),
                    format!("├ ✘ Model: {:?} (Missing `title`)", model.slug).red().strikethrough()
                );
                report.skipped += 1;
                continue;
            };
            let model_slug = non_empty(&model.slug)
                .map(str::to_string)
                .unwrap_or_else(|| slugify(title));
            if model_slug.is_empty() || TruckModel::get_by_slug(conn, &model_slug)?.is_some() {
                warn!(
                    "{} {}",
                    "│".blue(),
                    format!("├ Model: {} /{} already exists or has no slug, skipping", title, model_slug)
                        .yellow()
                );
                report.skipped += 1;
                continue;
            }
            TruckModel::add(
                conn,
                TruckModel {
                    id: None,
                    title: title.to_string(),
                    slug: model_slug.clone(),
                    manufacturer_id,
                    year_range: non_empty(&model.year_range).map(str::to_string),
                    model3d: model.model3d.clone(),
                    attribution: model.model3d_attribution.clone(),
                    content: model.content.clone(),
                },
            )?;
            report.models += 1;
            info!(
                "{} {}",
                "│".blue(),
                format!("├ Model: {} /{} ({} blocks)", title, model_slug, model.content.len()).green()
            );
        }
    }
    Ok(report)
}

fn export_catalog(conn: &Connection) -> Result<CatalogJson, Error> {
    let mut catalog = CatalogJson::default();
    for manufacturer in Manufacturer::get_all(conn)? {
        let models = match manufacturer.id {
            Some(id) => TruckModel::get_by_manufacturer(conn, id)?,
            None => vec![],
        };
        catalog.manufacturers.push(ManufacturerJson {
            name: Some(manufacturer.name),
            slug: Some(manufacturer.slug),
            logo: manufacturer.logo,
            models: models
                .into_iter()
                .map(|model| ModelJson {
                    title: Some(model.title),
                    slug: Some(model.slug),
                    year_range: model.year_range,
                    model3d: model.model3d,
                    model3d_attribution: model.attribution,
                    content: model.content,
                })
                .collect(),
        });
    }
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libcatalog::db::tests::{memory_db, model_count};
    use crate::libcatalog::db::CarouselImage;

    const CATALOG: &str = r#"{
        "manufacturers": [
            {
                "name": "Toyota",
                "models": [
                    {
                        "title": "Tacoma 1995-2004 (1st Gen)",
                        "year_range": "1995-2004",
                        "model3d": "file-abc-glb",
                        "model3d_attribution": {"creator": "someone", "license": "CC0"},
                        "content": [
                            {"_type": "block", "style": "h2", "children": [{"text": "History"}]},
                            {"_type": "image", "asset": "image-a-800x600-jpg", "caption": "Stock"}
                        ]
                    },
                    {"slug": "no-title"}
                ]
            },
            {"slug": "nameless", "models": [{"title": "Ghost"}]},
            {"name": "Ford", "slug": "ford", "models": [{"title": "Ranger", "slug": "ranger"}]}
        ]
    }"#;

    #[test]
    fn imports_valid_entries_and_skips_the_rest() {
        let conn = memory_db();
        let content: CatalogJson = serde_json::from_str(CATALOG).unwrap();
        let report = import_catalog(&conn, &content).unwrap();
        assert_eq!(
            report,
            ImportReport {
                manufacturers: 2,
                models: 2,
                skipped: 3
            }
        );

        let tacoma = TruckModel::get_by_slug(&conn, "tacoma-1995-2004-1st-gen")
            .unwrap()
            .unwrap();
        assert_eq!(tacoma.year_range.as_deref(), Some("1995-2004"));
        assert_eq!(tacoma.attribution.unwrap().license.as_deref(), Some("CC0"));
        assert!(Manufacturer::get_by_slug(&conn, "toyota").unwrap().is_some());
        assert_eq!(CarouselImage::get_all(&conn).unwrap().len(), 1);
    }

    #[test]
    fn reimport_does_not_duplicate() {
        let conn = memory_db();
        let content: CatalogJson = serde_json::from_str(CATALOG).unwrap();
        import_catalog(&conn, &content).unwrap();
        let again = import_catalog(&conn, &content).unwrap();
        assert_eq!((again.manufacturers, again.models), (0, 0));
        assert_eq!(model_count(&conn), 2);
    }

    #[test]
    fn failed_import_leaves_nothing_behind() {
        let conn = memory_db();
        conn.execute_batch(
            "CREATE TRIGGER no_rangers BEFORE INSERT ON TruckModel
             WHEN NEW.slug = 'ranger'
             BEGIN SELECT RAISE(ABORT, 'no rangers'); END;",
        )
        .unwrap();
        let content: CatalogJson = serde_json::from_str(CATALOG).unwrap();

        assert!(matches!(import_catalog(&conn, &content), Err(Error::Db(_))));
        assert!(Manufacturer::get_all(&conn).unwrap().is_empty());
        assert_eq!(model_count(&conn), 0);
    }

    #[test]
    fn export_feeds_back_into_import() {
        let conn = memory_db();
        let content: CatalogJson = serde_json::from_str(CATALOG).unwrap();
        import_catalog(&conn, &content).unwrap();
        let exported = export_catalog(&conn).unwrap();
        let names: Vec<_> = exported
            .manufacturers
            .iter()
            .map(|m| m.name.clone().unwrap())
            .collect();
        assert_eq!(names, vec!["Ford", "Toyota"]);

        let fresh = memory_db();
        let report = import_catalog(&fresh, &exported).unwrap();
        assert_eq!((report.manufacturers, report.models, report.skipped), (2, 2, 0));
        assert_eq!(export_catalog(&fresh).unwrap(), exported);
    }
}
