use crate::libcatalog::choices::CatalogItem;
use crate::libcatalog::db::CarouselImage;
use log::debug;
use rand::rng;
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

/// How long a slide stays up while auto-playing.
pub(crate) const AUTOPLAY_INTERVAL: Duration = Duration::from_secs(4);

/// Catch-all manufacturer whose models are shown by title alone.
const CATCH_ALL_MANUFACTURER: &str = "More...";

static YEAR_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}[-–—]\s*(?:19|20)\d{2}\b").unwrap());
static YEAR_RANGE_DASH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-–—]\s*").unwrap());
static SINGLE_YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());

#[derive(Debug)]
pub(crate) struct Carousel {
    images: Vec<CarouselImage>,
    current: usize,
    autoplay: bool,
    since_advance: Duration,
}

impl Carousel {
    pub fn new(images: Vec<CarouselImage>) -> Self {
        Self::new_with(images, &mut rng())
    }

    /// Shuffles the slides once up front.
    pub fn new_with<R: Rng + ?Sized>(mut images: Vec<CarouselImage>, rng: &mut R) -> Self {
        images.shuffle(rng);
        debug!("[Carousel] Loaded {} images", images.len());
        Self {
            images,
            current: 0,
            autoplay: true,
            since_advance: Duration::ZERO,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&CarouselImage> {
        self.images.get(self.current)
    }

    pub fn images(&self) -> &[CarouselImage] {
        &self.images
    }

    pub fn next(&mut self) {
        if self.images.is_empty() {
            return;
        }
        self.current = (self.current + 1) % self.images.len();
        self.since_advance = Duration::ZERO;
    }

    pub fn prev(&mut self) {
        if self.images.is_empty() {
            return;
        }
        self.current = (self.current + self.images.len() - 1) % self.images.len();
        self.since_advance = Duration::ZERO;
    }

    pub fn go_to(&mut self, index: usize) {
        if index < self.images.len() {
            self.current = index;
            self.since_advance = Duration::ZERO;
        }
    }

    pub fn set_autoplay(&mut self, autoplay: bool) {
        self.autoplay = autoplay;
        self.since_advance = Duration::ZERO;
    }

    pub fn autoplay(&self) -> bool {
        self.autoplay
    }

    /// Feeds elapsed time into auto-play. Returns true when the slide changed.
    pub fn tick(&mut self, elapsed: Duration) -> bool {
        if !self.autoplay || self.images.len() <= 1 {
            return false;
        }
        self.since_advance += elapsed;
        if self.since_advance >= AUTOPLAY_INTERVAL {
            self.next();
            true
        } else {
            false
        }
    }

    /// Trivia pool: one item per slide, grouped by manufacturer.
    pub fn pool(&self) -> Vec<CatalogItem> {
        self.images
            .iter()
            .map(|image| CatalogItem::new(image.truck_title.clone(), image.manufacturer_name.clone()))
            .collect()
    }
}

pub(crate) fn display_title(image: &CarouselImage) -> String {
    if image.manufacturer_name == CATCH_ALL_MANUFACTURER {
        image.truck_title.clone()
    } else {
        format!("{} {}", image.manufacturer_name, image.truck_title)
    }
}

/// The date stamp shown in the corner of a slide.
pub(crate) fn year_label(image: &CarouselImage) -> String {
    if let Some(range) = image.year_range.as_deref().filter(|r| !r.is_empty()) {
        return range.to_string();
    }
    if let Some(found) = YEAR_RANGE.find(&image.truck_title) {
        return YEAR_RANGE_DASH.replace(found.as_str(), "-").into_owned();
    }
    if let Some(found) = SINGLE_YEAR.find(&image.truck_title) {
        return format!("{0}-{0}", found.as_str());
    }
    "----".to_string()
}

/// Route of the model page a slide links to.
pub(crate) fn model_path(image: &CarouselImage) -> String {
    format!("/{}/{}", image.manufacturer_slug, image.truck_slug)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    pub(crate) fn slide(title: &str, manufacturer: &str) -> CarouselImage {
        CarouselImage {
            asset: format!("image-{}-10x10-jpg", title.len()),
            alt: None,
            caption: None,
            truck_title: title.to_string(),
            year_range: None,
            manufacturer_name: manufacturer.to_string(),
            truck_slug: title.to_lowercase(),
            manufacturer_slug: manufacturer.to_lowercase(),
        }
    }

    fn carousel(n: usize) -> Carousel {
        let images = (0..n).map(|i| slide(&format!("T{i}"), "Toyota")).collect();
        Carousel::new_with(images, &mut StdRng::seed_from_u64(1))
    }

    #[test]
    fn navigation_wraps_around() {
        let mut c = carousel(3);
        c.prev();
        assert_eq!(c.current_index(), 2);
        c.next();
        assert_eq!(c.current_index(), 0);
        c.go_to(1);
        assert_eq!(c.current_index(), 1);
        c.go_to(9);
        assert_eq!(c.current_index(), 1);
    }

    #[test]
    fn shuffle_keeps_every_slide() {
        let c = carousel(10);
        let mut titles: Vec<_> = c.images().iter().map(|i| i.truck_title.clone()).collect();
        titles.sort();
        let mut expected: Vec<_> = (0..10).map(|i| format!("T{i}")).collect();
        expected.sort();
        assert_eq!(titles, expected);
    }

    #[test]
    fn autoplay_advances_every_interval() {
        let mut c = carousel(2);
        assert!(!c.tick(Duration::from_secs(3)));
        assert!(c.tick(Duration::from_secs(1)));
        assert_eq!(c.current_index(), 1);

        c.set_autoplay(false);
        assert!(!c.tick(Duration::from_secs(10)));
        assert_eq!(c.current_index(), 1);
    }

    #[test]
    fn single_slide_never_autoplays() {
        let mut c = carousel(1);
        assert!(!c.tick(Duration::from_secs(60)));
        let mut empty = Carousel::new(vec![]);
        empty.next();
        empty.prev();
        assert!(empty.current().is_none());
    }

    #[test]
    fn titles_skip_catch_all_manufacturer() {
        assert_eq!(display_title(&slide("Tacoma", "Toyota")), "Toyota Tacoma");
        assert_eq!(display_title(&slide("Brat", "More...")), "Brat");
    }

    #[test]
    fn year_label_fallbacks() {
        let mut image = slide("Tacoma 1995–2004 (1st Gen)", "Toyota");
        assert_eq!(year_label(&image), "1995-2004");

        image.truck_title = "Hilux 1979—  1983".to_string();
        assert_eq!(year_label(&image), "1979-1983");

        // A space before the dash is not a range.
        image.truck_title = "Hilux 1979 - 1983".to_string();
        assert_eq!(year_label(&image), "1979-1979");

        image.truck_title = "Pickup 1986".to_string();
        assert_eq!(year_label(&image), "1986-1986");

        image.truck_title = "Tundra".to_string();
        assert_eq!(year_label(&image), "----");

        image.year_range = Some("2000-2006".to_string());
        assert_eq!(year_label(&image), "2000-2006");
    }

    #[test]
    fn pool_groups_by_manufacturer() {
        let c = Carousel::new_with(
            vec![slide("Tacoma", "Toyota"), slide("Ranger", "Ford")],
            &mut StdRng::seed_from_u64(3),
        );
        let pool = c.pool();
        assert_eq!(pool.len(), 2);
        assert!(pool.contains(&CatalogItem::new("Ranger", "Ford")));
        assert_eq!(model_path(&slide("Tacoma", "Toyota")), "/toyota/tacoma");
    }
}
