use log::{debug, error, info, warn};
use rusqlite::types::Type;
use rusqlite::{params, Connection, DatabaseName, OptionalExtension, Result, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub struct Manufacturer {
    pub id: Option<i32>,
    pub name: String,
    pub slug: String,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TruckModel {
    pub id: Option<i32>,
    pub title: String,
    pub slug: String,
    pub manufacturer_id: i32,
    pub year_range: Option<String>,
    /// File asset reference of the GLB model.
    pub model3d: Option<String>,
    pub attribution: Option<Attribution>,
    pub content: Vec<ContentBlock>,
}

/// Credit for a 3D model.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Attribution {
    pub creator: Option<String>,
    pub source: Option<String>,
    pub license: Option<String>,
}

impl Attribution {
    fn from_columns(
        creator: Option<String>,
        source: Option<String>,
        license: Option<String>,
    ) -> Option<Attribution> {
        if creator.is_none() && source.is_none() && license.is_none() {
            None
        } else {
            Some(Attribution {
                creator,
                source,
                license,
            })
        }
    }
}

/// Rich text, stored as a JSON array in `TruckModel.content`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "_type", rename_all = "lowercase")]
pub enum ContentBlock {
    Block(TextBlock),
    Image(ImageBlock),
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TextBlock {
    #[serde(default)]
    pub style: BlockStyle,
    #[serde(default, rename = "listItem", skip_serializing_if = "Option::is_none")]
    pub list_item: Option<ListKind>,
    #[serde(default)]
    pub children: Vec<Span>,
}

impl TextBlock {
    pub fn plain_text(&self) -> String {
        self.children.iter().map(|s| s.text.as_str()).collect()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BlockStyle {
    #[default]
    Normal,
    H1,
    H2,
    H3,
    Blockquote,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Bullet,
    Number,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Span {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mark {
    Strong,
    Em,
    Code,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ImageBlock {
    pub asset: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// An image from a model's content, joined with the model it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct CarouselImage {
    pub asset: String,
    pub alt: Option<String>,
    pub caption: Option<String>,
    pub truck_title: String,
    pub year_range: Option<String>,
    pub manufacturer_name: String,
    pub truck_slug: String,
    pub manufacturer_slug: String,
}

impl Manufacturer {
    pub fn new(
        connection: &Connection,
        name: String,
        slug: String,
        logo: Option<String>,
    ) -> Result<i32> {
        match connection.execute(
            "INSERT INTO Manufacturer(name, slug, logo) VALUES (?1, ?2, ?3)",
            params![name, slug, logo],
        ) {
            Ok(_) => {
                let id = connection.last_insert_rowid() as i32;
                debug!("[DB] Created new Manufacturer {} '{}' ({})", id, name, slug);
                Ok(id)
            }
            Err(err) => {
                error!("[DB] Error while creating new Manufacturer: {:?}", err);
                Err(err)
            }
        }
    }

    pub fn add(connection: &Connection, src: Manufacturer) -> Result<i32> {
        Self::new(connection, src.name, src.slug, src.logo)
    }

    fn from_row(row: &Row) -> Result<Manufacturer> {
        Ok(Manufacturer {
            id: row.get(0)?,
            name: row.get(1)?,
            slug: row.get(2)?,
            logo: row.get(3)?,
        })
    }

    pub fn get_all(connection: &Connection) -> Result<Vec<Manufacturer>> {
        let mut statement = connection
            .prepare("SELECT id, name, slug, logo FROM Manufacturer ORDER BY name ASC")?;
        let rows = statement.query_map([], Self::from_row)?;

        rows.collect()
    }

    pub fn get_by_id(connection: &Connection, id: i32) -> Result<Option<Manufacturer>> {
        connection
            .query_row(
                "SELECT id, name, slug, logo FROM Manufacturer WHERE id = :id LIMIT 1",
                &[(":id", &id)],
                Self::from_row,
            )
            .optional()
    }

    pub fn get_by_slug(connection: &Connection, slug: &str) -> Result<Option<Manufacturer>> {
        connection
            .query_row(
                "SELECT id, name, slug, logo FROM Manufacturer WHERE slug = :slug LIMIT 1",
                &[(":slug", &slug)],
                Self::from_row,
            )
            .optional()
    }
}

const TRUCK_MODEL_COLUMNS: &str = "id, title, slug, manufacturerId, yearRange, model3d, \
     attributionCreator, attributionSource, attributionLicense, content";

impl TruckModel {
    pub fn add(connection: &Connection, src: TruckModel) -> Result<i32> {
        let content = serde_json::to_string(&src.content)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        let attribution = src.attribution.unwrap_or_default();
        match connection.execute(
            "INSERT INTO TruckModel(title, slug, manufacturerId, yearRange, model3d, \
             attributionCreator, attributionSource, attributionLicense, content) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                src.title,
                src.slug,
                src.manufacturer_id,
                src.year_range,
                src.model3d,
                attribution.creator,
                attribution.source,
                attribution.license,
                content
            ],
        ) {
            Ok(_) => {
                let id = connection.last_insert_rowid() as i32;
                debug!(
                    "[DB] Created new TruckModel {} '{}' for Manufacturer {}",
                    id, src.title, src.manufacturer_id
                );
                Ok(id)
            }
            Err(err) => {
                error!("[DB] Error while creating new TruckModel '{}': {:?}", src.title, err);
                Err(err)
            }
        }
    }

    fn from_row(row: &Row) -> Result<TruckModel> {
        let content: String = row.get(9)?;
        let content = serde_json::from_str(&content)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(9, Type::Text, Box::new(e)))?;
        Ok(TruckModel {
            id: row.get(0)?,
            title: row.get(1)?,
            slug: row.get(2)?,
            manufacturer_id: row.get(3)?,
            year_range: row.get(4)?,
            model3d: row.get(5)?,
            attribution: Attribution::from_columns(row.get(6)?, row.get(7)?, row.get(8)?),
            content,
        })
    }

    pub fn get_by_slug(connection: &Connection, slug: &str) -> Result<Option<TruckModel>> {
        connection
            .query_row(
                &format!("SELECT {TRUCK_MODEL_COLUMNS} FROM TruckModel WHERE slug = :slug LIMIT 1"),
                &[(":slug", &slug)],
                Self::from_row,
            )
            .optional()
    }

    /// Models of one manufacturer, oldest year range first.
    pub fn get_by_manufacturer(connection: &Connection, manufacturer_id: i32) -> Result<Vec<TruckModel>> {
        let mut statement = connection.prepare(&format!(
            "SELECT {TRUCK_MODEL_COLUMNS} FROM TruckModel \
             WHERE manufacturerId = :manufacturerId ORDER BY yearRange ASC, title ASC"
        ))?;
        let rows = statement.query_map(&[(":manufacturerId", &manufacturer_id)], Self::from_row)?;

        rows.collect()
    }

    pub fn images(&self) -> impl Iterator<Item = &ImageBlock> {
        self.content.iter().filter_map(|block| match block {
            ContentBlock::Image(image) => Some(image),
            ContentBlock::Block(_) => None,
        })
    }
}

impl CarouselImage {
    /// Every image of every model, for the home page carousel.
    pub fn get_all(connection: &Connection) -> Result<Vec<CarouselImage>> {
        let now = Instant::now();
        let mut statement = connection.prepare(
            "SELECT t.id, t.title, t.slug, t.manufacturerId, t.yearRange, t.model3d, \
             t.attributionCreator, t.attributionSource, t.attributionLicense, t.content, \
             m.name, m.slug \
             FROM TruckModel t JOIN Manufacturer m ON m.id = t.manufacturerId ORDER BY t.id",
        )?;
        let rows = statement.query_map([], |row| {
            Ok((TruckModel::from_row(row)?, row.get::<usize, String>(10)?, row.get::<usize, String>(11)?))
        })?;

        let mut images = Vec::new();
        for row in rows {
            let (model, manufacturer_name, manufacturer_slug) = row?;
            images.extend(model.images().map(|image| CarouselImage {
                asset: image.asset.clone(),
                alt: image.alt.clone(),
                caption: image.caption.clone(),
                truck_title: model.title.clone(),
                year_range: model.year_range.clone(),
                manufacturer_name: manufacturer_name.clone(),
                truck_slug: model.slug.clone(),
                manufacturer_slug: manufacturer_slug.clone(),
            }));
        }
        debug!(
            "[DB] Collected {} carousel images in {} ms.",
            images.len(),
            now.elapsed().as_millis()
        );
        Ok(images)
    }
}

pub(crate) fn create_or_open(src: &Path) -> Result<Connection> {
    if src.exists() {
        info!("[DB] Opening existing Database");
        open_db(src)
    } else {
        info!("[DB] Creating new Database");
        create_db(src)
    }
}

/// Builds the schema in memory and writes it out to `dest` in one go.
pub(crate) fn create_db(dest: &Path) -> Result<Connection> {
    let now = Instant::now();
    let db = Connection::open_in_memory()?;
    init_db(&db)?;
    if let Err(err) = db.backup(DatabaseName::Main, dest, None) {
        warn!("[DB] Failed to create database file: {}", err);
        close_db(db)?;
        return Err(err);
    }
    close_db(db)?;
    debug!(
        "[DB] Creating and Saving took {} ms.",
        now.elapsed().as_millis()
    );
    open_db(dest)
}

pub(crate) fn open_db(src: &Path) -> Result<Connection> {
    let now = Instant::now();
    let db = Connection::open(src)?;
    db.pragma_update(None, "foreign_keys", "ON")?;
    debug!("[DB] Opening took {} ms.", now.elapsed().as_millis());
    Ok(db)
}

pub(crate) fn close_db(connection: Connection) -> Result<()> {
    info!("[DB] Closing Database");
    let mut connection = connection;
    for attempt in 1..=3 {
        match connection.close() {
            Ok(_) => return Ok(()),
            Err((conn, err)) => {
                if attempt == 3 {
                    error!("[DB] Cannot close connection! Giving up.");
                    return Err(err);
                }
                error!("[DB] Cannot close connection. Retrying {}/2...", attempt);
                connection = conn;
            }
        }
    }
    Ok(())
}

pub(crate) fn init_db(conn: &Connection) -> Result<()> {
    info!("[DB INIT] Creating tables");
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.execute(
        "CREATE TABLE Manufacturer (
              id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
              name TEXT NOT NULL,
              slug TEXT NOT NULL UNIQUE,
              logo TEXT
            )",
        (),
    )?;
    info!("[DB INIT] Created table Manufacturer");
    conn.execute(
        "CREATE TABLE TruckModel (
              id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
              title TEXT NOT NULL,
              slug TEXT NOT NULL UNIQUE,
              manufacturerId INTEGER NOT NULL,
              yearRange TEXT,
              model3d TEXT,
              attributionCreator TEXT,
              attributionSource TEXT,
              attributionLicense TEXT,
              content TEXT NOT NULL DEFAULT '[]',
              FOREIGN KEY (manufacturerId) REFERENCES Manufacturer(id) ON DELETE CASCADE ON UPDATE CASCADE
            )",
        (),
    )?;
    info!("[DB INIT] Created table TruckModel");
    conn.execute(
        "CREATE INDEX TruckModel_manufacturerId_idx ON TruckModel(manufacturerId)",
        (),
    )?;
    info!("[DB INIT] Created index TruckModel_manufacturerId_idx");
    info!("[DB INIT] Database Creation Successful!");

    Ok(())
}
