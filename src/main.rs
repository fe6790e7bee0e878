use clap::{Parser, Subcommand};
use colored::Colorize;
use env_logger::Env;
use log::{debug, error, warn};
use rusqlite::Connection;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

mod cli;
mod libcatalog;
mod pages;

use crate::libcatalog::assets::Cdn;
use crate::libcatalog::carousel::Carousel;
use crate::libcatalog::db;
use crate::libcatalog::db::CarouselImage;
use crate::libcatalog::trivia::{GameSettings, TriviaError, QUESTIONS_PER_GAME, QUESTION_SECONDS};

#[derive(Parser, Debug)]
#[command(name = "truckcatalog")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, value_name = "FILE", default_value = "trucks.db")]
    db: PathBuf,
    #[arg(short, long, default_value = "error")]
    log_level: String,
    /// CDN project the asset references belong to.
    #[arg(long, default_value = "xbw6uf6e")]
    project_id: String,
    #[arg(long, default_value = "production")]
    dataset: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every manufacturer.
    Manufacturers,
    /// List the models of one manufacturer.
    Models { manufacturer: String },
    /// Show a model page.
    Show { manufacturer: String, model: String },
    /// Cycle through every truck image.
    Slideshow {
        #[arg(short, long, default_value = "10")]
        frames: usize,
    },
    /// Step through the slides by hand.
    Browse,
    /// "What model is this?"
    Play {
        #[arg(short, long, default_value_t = QUESTIONS_PER_GAME)]
        question_count: u32,
        #[arg(short, long, default_value_t = QUESTION_SECONDS)]
        seconds: u32,
    },
}

#[derive(Debug, Error)]
enum Error {
    #[error("no truck images in the catalog!")]
    NoImages,
    #[error("404: {0} not found")]
    NotFound(String),
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("terminal error: {0}")]
    Io(#[from] io::Error),
    #[error("trivia error: {0}")]
    Trivia(TriviaError),
}

impl From<TriviaError> for Error {
    fn from(err: TriviaError) -> Self {
        match err {
            TriviaError::NoImages => Error::NoImages,
            other => Error::Trivia(other),
        }
    }
}

fn main() {
    let args = Args::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(args.log_level)).init();

    let conn = match db::create_or_open(&args.db) {
        Ok(conn) => conn,
        Err(err) => {
            error!("[DB] Unable to open {:?}: {}", args.db, err);
            println!("{}", Error::from(err).to_string().bright_red());
            std::process::exit(1);
        }
    };
    debug!("[DB] Database Connection Successful!");
    let cdn = Cdn::new(args.project_id, args.dataset);

    let result = run(&conn, &cdn, args.command);
    if let Err(err) = finish(conn, result) {
        warn!("[Setup] {:?}", err);
        println!("{}", err.to_string().bright_red());
        std::process::exit(1);
    }
}

fn run(conn: &Connection, cdn: &Cdn, command: Commands) -> Result<(), Error> {
    match command {
        Commands::Manufacturers => pages::manufacturers(conn),
        Commands::Models { manufacturer } => pages::models(conn, &manufacturer),
        Commands::Show {
            manufacturer,
            model,
        } => pages::model(conn, cdn, &manufacturer, &model),
        Commands::Slideshow { frames } => {
            let mut carousel = Carousel::new(CarouselImage::get_all(conn)?);
            pages::slideshow(&mut carousel, cdn, frames)
        }
        Commands::Browse => {
            let mut carousel = Carousel::new(CarouselImage::get_all(conn)?);
            pages::browse(&mut carousel, cdn)
        }
        Commands::Play {
            question_count,
            seconds,
        } => {
            let mut carousel = Carousel::new(CarouselImage::get_all(conn)?);
            debug!("[Setup] Carousel: {} images", carousel.len());
            let settings = GameSettings {
                question_count,
                seconds_per_question: seconds,
            };
            cli::trivia_loop(&mut carousel, cdn, settings)
        }
    }
}

fn finish(conn: Connection, to_error: Result<(), Error>) -> Result<(), Error> {
    db::close_db(conn)?;
    to_error
}
