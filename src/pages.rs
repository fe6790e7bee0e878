use crate::libcatalog::assets::{Cdn, ImageParams};
use crate::libcatalog::carousel::{display_title, model_path, year_label, Carousel, AUTOPLAY_INTERVAL};
use crate::libcatalog::db::{
    BlockStyle, ContentBlock, ListKind, Manufacturer, Mark, Span, TextBlock, TruckModel,
};
use crate::Error;
use colored::{ColoredString, Colorize};
use log::{debug, warn};
use rusqlite::Connection;
use std::io::{self, Write};
use std::thread::sleep;
use text_io::read;

pub fn manufacturers(conn: &Connection) -> Result<(), Error> {
    let manufacturers = Manufacturer::get_all(conn)?;
    if manufacturers.is_empty() {
        println!(
            "{}",
            "No manufacturers yet. Import a catalog with `catalog-io import`!".yellow()
        );
        return Ok(());
    }
    println!("{}", "==========> Manufacturers <==========".cyan());
    for manufacturer in manufacturers {
        println!(
            "{} {}",
            manufacturer.name.bold(),
            format!("/{}", manufacturer.slug).dimmed()
        );
    }
    Ok(())
}

pub fn models(conn: &Connection, manufacturer_slug: &str) -> Result<(), Error> {
    let manufacturer = Manufacturer::get_by_slug(conn, manufacturer_slug)?
        .ok_or_else(|| Error::NotFound(format!("/{}", manufacturer_slug)))?;
    let id = manufacturer.id.ok_or_else(|| Error::NotFound(format!("/{}", manufacturer_slug)))?;
    let models = TruckModel::get_by_manufacturer(conn, id)?;

    println!("{}", format!("==========> {} <==========", manufacturer.name).cyan());
    if models.is_empty() {
        println!("{}", "No models yet.".yellow());
    }
    for model in models {
        let years = model
            .year_range
            .as_deref()
            .map(|years| format!(" ({})", years))
            .unwrap_or_default();
        println!(
            "{}{} {}",
            model.title.bold(),
            years,
            format!("/{}/{}", manufacturer.slug, model.slug).dimmed()
        );
    }
    Ok(())
}

pub fn model(
    conn: &Connection,
    cdn: &Cdn,
    manufacturer_slug: &str,
    model_slug: &str,
) -> Result<(), Error> {
    let path = format!("/{}/{}", manufacturer_slug, model_slug);
    let model = TruckModel::get_by_slug(conn, model_slug)?.ok_or_else(|| Error::NotFound(path.clone()))?;
    let manufacturer = Manufacturer::get_by_id(conn, model.manufacturer_id)?
        .ok_or_else(|| Error::NotFound(path.clone()))?;
    if manufacturer.slug != manufacturer_slug {
        warn!(
            "[Pages] {} belongs to {}, not {}",
            model.slug, manufacturer.slug, manufacturer_slug
        );
        return Err(Error::NotFound(path));
    }

    println!(
        "{}",
        format!("==========> {} {} <==========", manufacturer.name, model.title).cyan()
    );
    if let Some(years) = &model.year_range {
        println!("{}", years.bright_yellow());
    }
    println!();
    for line in render_content(&model.content, cdn) {
        println!("{}", line);
    }

    if let Some(model3d) = &model.model3d {
        println!();
        match cdn.file_url(model3d) {
            Some(url) => println!("{} {}", "3D model:".bold(), url),
            None => warn!("[Pages] Unusable 3D model reference {:?}", model3d),
        }
        if let Some(attribution) = &model.attribution {
            let parts: Vec<String> = [
                attribution.creator.as_ref().map(|c| format!("by {}", c)),
                attribution.license.as_ref().map(|l| format!("licensed {}", l)),
                attribution.source.as_ref().map(|s| format!("<{}>", s)),
            ]
            .into_iter()
            .flatten()
            .collect();
            println!("{}", parts.join(", ").dimmed());
        }
    }
    Ok(())
}

pub fn slideshow(carousel: &mut Carousel, cdn: &Cdn, frames: usize) -> Result<(), Error> {
    if carousel.is_empty() {
        println!("{}", "No truck images to show.".yellow());
        return Ok(());
    }
    for frame in 0..frames {
        print_slide(carousel, cdn);
        if frame + 1 < frames {
            sleep(AUTOPLAY_INTERVAL);
            if !carousel.tick(AUTOPLAY_INTERVAL) {
                debug!("[Carousel] Nothing to advance to");
            }
        }
    }
    Ok(())
}

#[derive(Debug, PartialEq)]
pub(crate) enum Nav {
    Next,
    Prev,
    GoTo(usize),
    ToggleAutoplay,
    Wait,
    Quit,
}

impl Nav {
    /// `n`/`p` step, a 1-based number jumps, `a` toggles auto-play, Enter waits.
    pub(crate) fn from_str(input: &str) -> Nav {
        match input.trim().to_ascii_lowercase().as_str() {
            "q" => Nav::Quit,
            "n" => Nav::Next,
            "p" => Nav::Prev,
            "a" => Nav::ToggleAutoplay,
            other => match other.parse::<usize>() {
                Ok(number) if number >= 1 => Nav::GoTo(number - 1),
                _ => Nav::Wait,
            },
        }
    }
}

/// Applies one command. Stepping by hand pauses auto-play; waiting lets one
/// auto-play interval pass. Returns false once the user quits.
pub(crate) fn navigate(carousel: &mut Carousel, nav: Nav) -> bool {
    match nav {
        Nav::Quit => return false,
        Nav::Next => {
            carousel.set_autoplay(false);
            carousel.next();
        }
        Nav::Prev => {
            carousel.set_autoplay(false);
            carousel.prev();
        }
        Nav::GoTo(index) => {
            carousel.set_autoplay(false);
            carousel.go_to(index);
        }
        Nav::ToggleAutoplay => carousel.set_autoplay(!carousel.autoplay()),
        Nav::Wait => {
            carousel.tick(AUTOPLAY_INTERVAL);
        }
    }
    true
}

pub fn browse(carousel: &mut Carousel, cdn: &Cdn) -> Result<(), Error> {
    if carousel.is_empty() {
        println!("{}", "No truck images to show.".yellow());
        return Ok(());
    }
    println!("{}", "==========> Slides <==========".cyan());
    for (i, image) in carousel.images().iter().enumerate() {
        println!("{} {}", format!("{:>3}.", i + 1).yellow(), display_title(image));
    }

    loop {
        println!();
        print_slide(carousel, cdn);
        let status = if carousel.autoplay() { "on" } else { "off" };
        print!(
            "{} ",
            format!(
                "[{}/{}, auto-play {}] n/p, number, a, Enter, q:",
                carousel.current_index() + 1,
                carousel.len(),
                status
            )
            .cyan()
        );
        io::stdout().flush()?;

        let input: String = read!("{}\n");
        let nav = Nav::from_str(&input);
        debug!("[Carousel] {:?}", nav);
        if !navigate(carousel, nav) {
            return Ok(());
        }
    }
}

fn print_slide(carousel: &Carousel, cdn: &Cdn) {
    let Some(image) = carousel.current() else {
        return;
    };
    let url = cdn
        .image_url(&image.asset, ImageParams::default().quality(85))
        .unwrap_or_else(|| image.asset.clone());
    println!(
        "{} {} {}",
        display_title(image).to_uppercase().bold(),
        year_label(image).bright_yellow(),
        model_path(image).dimmed()
    );
    println!("  {}", url);
    if let Some(caption) = &image.caption {
        println!("  {}", caption.to_uppercase().dimmed());
    }
}

/// Rich text as terminal lines.
pub(crate) fn render_content(content: &[ContentBlock], cdn: &Cdn) -> Vec<String> {
    let mut lines = Vec::new();
    let mut number = 0;
    for block in content {
        match block {
            ContentBlock::Block(text) => {
                number = match text.list_item {
                    Some(ListKind::Number) => number + 1,
                    _ => 0,
                };
                lines.push(render_block(text, number));
            }
            ContentBlock::Image(image) => {
                number = 0;
                let url = cdn
                    .image_url(&image.asset, ImageParams::sized(600, 400))
                    .unwrap_or_else(|| image.asset.clone());
                lines.push(format!("[{}] {}", image.alt.as_deref().unwrap_or("image"), url));
                if let Some(caption) = &image.caption {
                    lines.push(caption.to_uppercase().dimmed().to_string());
                }
            }
        }
    }
    lines
}

fn render_block(block: &TextBlock, number: usize) -> String {
    let text: String = block.children.iter().map(|s| render_span(s).to_string()).collect();
    let prefix = match block.list_item {
        Some(ListKind::Bullet) => "▶ ".yellow().to_string(),
        Some(ListKind::Number) => format!("{}. ", number).yellow().to_string(),
        None => String::new(),
    };
    let body = match block.style {
        BlockStyle::Normal => text,
        BlockStyle::H1 => block.plain_text().to_uppercase().bold().underline().to_string(),
        BlockStyle::H2 => block.plain_text().to_uppercase().bold().to_string(),
        BlockStyle::H3 => block.plain_text().bold().to_string(),
        BlockStyle::Blockquote => format!("│ {}", text.italic()),
    };
    format!("{}{}", prefix, body)
}

fn render_span(span: &Span) -> ColoredString {
    let mut styled = ColoredString::from(span.text.as_str());
    for mark in &span.marks {
        styled = match mark {
            Mark::Strong => styled.bold(),
            Mark::Em => styled.yellow(),
            Mark::Code => styled.on_bright_black().yellow(),
        };
    }
    styled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libcatalog::carousel::tests::slide;
    use crate::libcatalog::db::tests::{manufacturer, memory_db, model as truck};
    use crate::libcatalog::db::ImageBlock;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn catalog() -> Connection {
        let conn = memory_db();
        let toyota = Manufacturer::add(&conn, manufacturer("Toyota", "toyota")).unwrap();
        let ford = Manufacturer::add(&conn, manufacturer("Ford", "ford")).unwrap();
        TruckModel::add(&conn, truck("Tacoma", "tacoma", toyota, Some("1995-2004"))).unwrap();
        TruckModel::add(&conn, truck("Ranger", "ranger", ford, None)).unwrap();
        conn
    }

    #[test]
    fn unknown_manufacturer_is_not_found() {
        let conn = catalog();
        assert!(matches!(models(&conn, "isuzu"), Err(Error::NotFound(_))));
        assert!(models(&conn, "toyota").is_ok());
    }

    #[test]
    fn unknown_model_is_not_found() {
        let conn = catalog();
        let cdn = Cdn::new("p", "d");
        assert!(matches!(
            model(&conn, &cdn, "toyota", "missing"),
            Err(Error::NotFound(_))
        ));
        assert!(model(&conn, &cdn, "toyota", "tacoma").is_ok());
    }

    #[test]
    fn model_under_the_wrong_manufacturer_is_not_found() {
        let conn = catalog();
        let cdn = Cdn::new("p", "d");
        assert!(matches!(
            model(&conn, &cdn, "ford", "tacoma"),
            Err(Error::NotFound(path)) if path == "/ford/tacoma"
        ));
    }

    fn slides() -> Carousel {
        Carousel::new_with(
            vec![
                slide("Tacoma", "Toyota"),
                slide("Ranger", "Ford"),
                slide("Hardbody", "Nissan"),
            ],
            &mut StdRng::seed_from_u64(2),
        )
    }

    #[test]
    fn parses_navigation() {
        assert_eq!(Nav::from_str("n\n"), Nav::Next);
        assert_eq!(Nav::from_str(" P "), Nav::Prev);
        assert_eq!(Nav::from_str("3"), Nav::GoTo(2));
        assert_eq!(Nav::from_str("0"), Nav::Wait);
        assert_eq!(Nav::from_str("a"), Nav::ToggleAutoplay);
        assert_eq!(Nav::from_str(""), Nav::Wait);
        assert_eq!(Nav::from_str("Q"), Nav::Quit);
    }

    #[test]
    fn stepping_by_hand_pauses_autoplay() {
        let mut c = slides();
        assert!(c.autoplay());
        assert!(navigate(&mut c, Nav::Prev));
        assert_eq!(c.current_index(), 2);
        assert!(!c.autoplay());

        // Paused: waiting stays put.
        navigate(&mut c, Nav::Wait);
        assert_eq!(c.current_index(), 2);

        navigate(&mut c, Nav::GoTo(1));
        assert_eq!(c.current_index(), 1);
        navigate(&mut c, Nav::GoTo(7));
        assert_eq!(c.current_index(), 1);
        navigate(&mut c, Nav::Next);
        assert_eq!(c.current_index(), 2);
        assert!(!navigate(&mut c, Nav::Quit));
    }

    #[test]
    fn waiting_with_autoplay_moves_one_slide() {
        let mut c = slides();
        navigate(&mut c, Nav::Wait);
        assert_eq!(c.current_index(), 1);

        navigate(&mut c, Nav::ToggleAutoplay);
        assert!(!c.autoplay());
        navigate(&mut c, Nav::Wait);
        assert_eq!(c.current_index(), 1);
        navigate(&mut c, Nav::ToggleAutoplay);
        assert!(c.autoplay());
    }

    fn block(list_item: Option<ListKind>, text: &str) -> ContentBlock {
        ContentBlock::Block(TextBlock {
            style: BlockStyle::Normal,
            list_item,
            children: vec![Span {
                text: text.to_string(),
                marks: vec![],
            }],
        })
    }

    #[test]
    fn numbered_lists_count_up_and_restart() {
        colored::control::set_override(false);
        let content = vec![
            block(Some(ListKind::Number), "one"),
            block(Some(ListKind::Number), "two"),
            block(None, "break"),
            block(Some(ListKind::Number), "again"),
            block(Some(ListKind::Bullet), "dot"),
        ];
        let lines = render_content(&content, &Cdn::new("p", "d"));
        assert_eq!(lines, vec!["1. one", "2. two", "break", "1. again", "▶ dot"]);
    }

    #[test]
    fn images_become_cdn_links() {
        colored::control::set_override(false);
        let content = vec![ContentBlock::Image(ImageBlock {
            asset: "image-abc-800x600-jpg".to_string(),
            alt: Some("side view".to_string()),
            caption: Some("Lifted".to_string()),
        })];
        let lines = render_content(&content, &Cdn::new("p", "d"));
        assert_eq!(
            lines,
            vec![
                "[side view] https://cdn.sanity.io/images/p/d/abc-800x600.jpg?w=600&h=400",
                "LIFTED",
            ]
        );
    }
}
