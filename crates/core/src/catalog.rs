use std::collections::HashSet;

use once_cell::sync::Lazy;

use crate::error::{EngineError, EngineResult, FieldIssue};
use crate::intent::ResponseBook;
use crate::models::{
    CatalogItem, Category, Destination, InterestTag, ItineraryItem, MapPoint, Product,
};
use crate::planner::ItineraryPools;

static CATALOG: Lazy<Catalog> = Lazy::new(Catalog::jharkhand);

/// Process-wide read-only catalog.
pub fn catalog() -> &'static Catalog {
    &CATALOG
}

#[derive(Debug, Clone)]
pub struct Catalog {
    destinations: Vec<Destination>,
    products: Vec<Product>,
    itinerary_pools: ItineraryPools,
    responses: ResponseBook,
}

impl Catalog {
    pub fn new(
        destinations: Vec<Destination>,
        products: Vec<Product>,
        itinerary_pools: ItineraryPools,
        responses: ResponseBook,
    ) -> Self {
        Self {
            destinations,
            products,
            itinerary_pools,
            responses,
        }
    }

    pub fn destinations(&self) -> &[Destination] {
        &self.destinations
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn itinerary_pools(&self) -> &ItineraryPools {
        &self.itinerary_pools
    }

    pub fn responses(&self) -> &ResponseBook {
        &self.responses
    }

    pub fn destination(&self, id: u32) -> Option<&Destination> {
        self.destinations.iter().find(|d| d.item.id == id)
    }

    pub fn product(&self, id: u32) -> Option<&Product> {
        self.products.iter().find(|p| p.item.id == id)
    }

    /// Checks the record invariants. Fixtures are expected to pass; this exists
    /// for tests and for catalogs assembled from outside data.
    pub fn validate(&self) -> EngineResult<()> {
        let mut issues = Vec::new();

        check_items(
            "destinations",
            self.destinations.iter().map(|d| &d.item),
            &mut issues,
        );
        for destination in &self.destinations {
            let MapPoint { x, y } = destination.coordinates;
            if !(0.0..=100.0).contains(&x) || !(0.0..=100.0).contains(&y) {
                issues.push(FieldIssue::new(
                    format!("destinations[{}].coordinates", destination.item.id),
                    "coordinates must lie in [0, 100]",
                ));
            }
        }

        check_items("products", self.products.iter().map(|p| &p.item), &mut issues);
        for product in &self.products {
            if !product.item.category.is_product_category() {
                issues.push(FieldIssue::new(
                    format!("products[{}].category", product.item.id),
                    "products are handicrafts or packages",
                ));
            }
            if matches!(product.original_price, Some(original) if original <= product.item.cost) {
                issues.push(FieldIssue::new(
                    format!("products[{}].original_price", product.item.id),
                    "original price must exceed price",
                ));
            }
        }

        check_items(
            "itinerary",
            self.itinerary_pools
                .iter()
                .flat_map(|(_, items)| items.iter().map(|i| &i.item)),
            &mut issues,
        );
        for (interest, items) in self.itinerary_pools.iter() {
            if let Some(stray) = items.iter().find(|i| i.interest != interest) {
                issues.push(FieldIssue::new(
                    format!("itinerary[{}].interest", stray.item.id),
                    format!("listed under {} pool", interest.as_code()),
                ));
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(EngineError::InvalidInput(issues))
        }
    }

    pub fn jharkhand() -> Self {
        Self::new(
            jharkhand_destinations(),
            jharkhand_products(),
            jharkhand_itinerary_pools(),
            ResponseBook::jharkhand(),
        )
    }
}

fn check_items<'a>(
    collection: &str,
    items: impl Iterator<Item = &'a CatalogItem>,
    issues: &mut Vec<FieldIssue>,
) {
    let mut ids = HashSet::new();
    for item in items {
        if !ids.insert(item.id) {
            issues.push(FieldIssue::new(
                format!("{collection}[{}].id", item.id),
                "duplicate identifier",
            ));
        }
        if !(0.0..=5.0).contains(&item.rating) {
            issues.push(FieldIssue::new(
                format!("{collection}[{}].rating", item.id),
                "rating must lie in [0, 5]",
            ));
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn destination(
    id: u32,
    name: &str,
    location: &str,
    rating: f32,
    duration: &str,
    cost: u32,
    category: Category,
    description: &str,
    highlights: &[&str],
    best_time: &str,
    coordinates: (f32, f32),
    media: &str,
) -> Destination {
    Destination {
        item: CatalogItem {
            id,
            name: name.to_string(),
            location: location.to_string(),
            cost,
            rating,
            category,
            description: description.to_string(),
            tags: highlights.iter().map(|h| h.to_lowercase()).collect(),
            media: media.to_string(),
        },
        duration: duration.to_string(),
        best_time: best_time.to_string(),
        highlights: highlights.iter().map(ToString::to_string).collect(),
        coordinates: MapPoint {
            x: coordinates.0,
            y: coordinates.1,
        },
    }
}

fn jharkhand_destinations() -> Vec<Destination> {
    vec![
        destination(
            1,
            "Hundru Falls",
            "Ranchi",
            4.8,
            "Half Day",
            1500,
            Category::Waterfalls,
            "A spectacular 98-meter waterfall formed by the Subarnarekha River, perfect for nature lovers and photographers.",
            &["98m waterfall", "Photography", "Nature walks", "Picnic spots"],
            "Oct-Mar",
            (45.0, 60.0),
            "/hundru-falls-waterfall-cascading-down-rocky-cliffs.jpg",
        ),
        destination(
            2,
            "Betla National Park",
            "Latehar",
            4.7,
            "Full Day",
            4000,
            Category::NationalParks,
            "Home to tigers, elephants, and diverse wildlife in the heart of Jharkhand's forests.",
            &["Tiger safari", "Elephant spotting", "Bird watching", "Forest trails"],
            "Nov-Apr",
            (25.0, 75.0),
            "/betla-national-park-with-elephants-and-dense-fores.jpg",
        ),
        destination(
            3,
            "Baidyanath Temple",
            "Deoghar",
            4.9,
            "Half Day",
            1000,
            Category::HeritageSites,
            "One of the twelve Jyotirlingas, a sacred pilgrimage site for millions of devotees.",
            &["Jyotirlinga", "Ancient architecture", "Spiritual experience", "Religious festivals"],
            "Year-round",
            (70.0, 30.0),
            "/baidyanath-temple-ancient-hindu-temple-with-devote.jpg",
        ),
        destination(
            4,
            "Netarhat Hill Station",
            "Latehar",
            4.6,
            "2 Days",
            6000,
            Category::HillStations,
            "Known as the 'Queen of Chotanagpur', famous for its mesmerizing sunrise and sunset views.",
            &["Sunrise views", "Sunset point", "Cool climate", "Trekking trails"],
            "Oct-Mar",
            (20.0, 85.0),
            "/netarhat-hill-station-sunrise-view-over-rolling-hi.jpg",
        ),
        destination(
            5,
            "Jonha Falls",
            "Ranchi",
            4.5,
            "Half Day",
            1200,
            Category::Waterfalls,
            "A sacred waterfall with a temple at the bottom, combining natural beauty with spirituality.",
            &["Sacred temple", "Natural pool", "Spiritual significance", "Rock formations"],
            "Oct-Mar",
            (50.0, 55.0),
            "/jonha-falls-waterfall-with-temple-and-pilgrims.jpg",
        ),
        destination(
            6,
            "Tribal Museum",
            "Ranchi",
            4.4,
            "2-3 Hours",
            800,
            Category::HeritageSites,
            "Explore the rich tribal heritage and traditional art forms of Jharkhand's indigenous communities.",
            &["Tribal artifacts", "Cultural exhibits", "Traditional crafts", "Educational tours"],
            "Year-round",
            (48.0, 58.0),
            "/tribal-museum-showcasing-jharkhand-tribal-artifact.jpg",
        ),
        destination(
            7,
            "Dassam Falls",
            "Ranchi",
            4.3,
            "Half Day",
            1300,
            Category::Waterfalls,
            "A beautiful waterfall cascading from a height of 44 meters, surrounded by dense forests.",
            &["44m cascade", "Forest setting", "Swimming", "Adventure activities"],
            "Jul-Feb",
            (52.0, 64.0),
            "/placeholder.svg?key=dassam",
        ),
        destination(
            8,
            "Palamau Tiger Reserve",
            "Latehar",
            4.5,
            "Full Day",
            3500,
            Category::NationalParks,
            "One of India's oldest tiger reserves with rich biodiversity and scenic landscapes.",
            &["Tiger reserve", "Wildlife safari", "Biodiversity", "Scenic beauty"],
            "Nov-Apr",
            (22.0, 70.0),
            "/placeholder.svg?key=palamau",
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn product(
    id: u32,
    name: &str,
    price: u32,
    original_price: Option<u32>,
    rating: f32,
    review_count: u32,
    category: Category,
    description: &str,
    seller: &str,
    in_stock: bool,
    featured: bool,
    tags: &[&str],
    media: &str,
) -> Product {
    Product {
        item: CatalogItem {
            id,
            name: name.to_string(),
            location: "Jharkhand".to_string(),
            cost: price,
            rating,
            category,
            description: description.to_string(),
            tags: tags.iter().map(ToString::to_string).collect(),
            media: media.to_string(),
        },
        original_price,
        review_count,
        in_stock,
        featured,
        seller: seller.to_string(),
    }
}

fn jharkhand_products() -> Vec<Product> {
    vec![
        product(
            1,
            "Traditional Bamboo Basket Set",
            1200,
            Some(1500),
            4.8,
            45,
            Category::Handicrafts,
            "Handwoven bamboo baskets by tribal artisans. Perfect for home decor and storage.",
            "Tribal Craft Collective",
            true,
            true,
            &["bamboo", "handwoven", "eco-friendly", "storage"],
            "/traditional-jharkhand-tribal-handicrafts-bamboo-an.jpg",
        ),
        product(
            2,
            "Betla Wildlife Safari Package",
            8500,
            None,
            4.9,
            128,
            Category::Packages,
            "2-day wildlife safari with accommodation, meals, and guided tours.",
            "Jharkhand Eco Tours",
            true,
            true,
            &["wildlife", "safari", "accommodation", "guided"],
            "/betla-national-park-with-elephants-and-dense-fores.jpg",
        ),
        product(
            3,
            "Tribal Art Painting Collection",
            2500,
            Some(3000),
            4.7,
            32,
            Category::Handicrafts,
            "Authentic Paitkar paintings depicting tribal life and mythology.",
            "Santhal Art Studio",
            true,
            false,
            &["painting", "tribal", "authentic", "mythology"],
            "/placeholder.svg?key=tribal-art",
        ),
        product(
            4,
            "Netarhat Hill Station Retreat",
            12000,
            None,
            4.6,
            89,
            Category::Packages,
            "3-day hill station package with sunrise tours and nature walks.",
            "Mountain View Resorts",
            true,
            true,
            &["hill station", "sunrise", "nature", "retreat"],
            "/netarhat-hill-station-sunrise-view-over-rolling-hi.jpg",
        ),
        product(
            5,
            "Handwoven Tribal Textiles",
            1800,
            None,
            4.5,
            67,
            Category::Handicrafts,
            "Traditional handwoven fabrics with authentic tribal patterns.",
            "Weaver's Guild",
            false,
            false,
            &["textiles", "handwoven", "traditional", "patterns"],
            "/placeholder.svg?key=textiles",
        ),
        product(
            6,
            "Waterfall Photography Tour",
            5500,
            None,
            4.8,
            156,
            Category::Packages,
            "Professional photography tour covering major waterfalls with expert guidance.",
            "Jharkhand Photo Tours",
            true,
            false,
            &["photography", "waterfalls", "professional", "guided"],
            "/hundru-falls-waterfall-cascading-down-rocky-cliffs.jpg",
        ),
        product(
            7,
            "Tribal Jewelry Set",
            3200,
            Some(4000),
            4.9,
            78,
            Category::Handicrafts,
            "Authentic tribal jewelry made with traditional techniques and materials.",
            "Heritage Jewelers",
            true,
            true,
            &["jewelry", "traditional", "authentic", "handmade"],
            "/placeholder.svg?key=jewelry",
        ),
        product(
            8,
            "Cultural Heritage Tour",
            7500,
            None,
            4.7,
            94,
            Category::Packages,
            "Immersive cultural experience with tribal villages and festivals.",
            "Cultural Connect Tours",
            true,
            false,
            &["culture", "heritage", "villages", "festivals"],
            "/tribal-festival-celebration-with-traditional-dance.jpg",
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn stop(
    id: u32,
    day: u32,
    interest: InterestTag,
    title: &str,
    location: &str,
    description: &str,
    duration: &str,
    cost: u32,
    rating: f32,
    media: &str,
) -> ItineraryItem {
    ItineraryItem {
        item: CatalogItem {
            id,
            name: title.to_string(),
            location: location.to_string(),
            cost,
            rating,
            category: interest.category(),
            description: description.to_string(),
            tags: vec![interest.as_code().to_string()],
            media: media.to_string(),
        },
        interest,
        duration: duration.to_string(),
        day,
    }
}

fn jharkhand_itinerary_pools() -> ItineraryPools {
    use InterestTag::*;

    ItineraryPools::new()
        .with_pool(
            Nature,
            vec![
                stop(
                    1,
                    1,
                    Nature,
                    "Hundru Falls Adventure",
                    "Ranchi",
                    "Visit the spectacular 98-meter waterfall and enjoy nature photography.",
                    "4-5 hours",
                    1500,
                    4.8,
                    "/hundru-falls-waterfall-cascading-down-rocky-cliffs.jpg",
                ),
                stop(
                    2,
                    2,
                    Nature,
                    "Jonha Falls & Temple Visit",
                    "Ranchi",
                    "Sacred waterfall with temple at the bottom, perfect for spiritual experience.",
                    "3-4 hours",
                    1200,
                    4.6,
                    "/jonha-falls-waterfall-with-temple-and-pilgrims.jpg",
                ),
            ],
        )
        .with_pool(
            Culture,
            vec![
                stop(
                    3,
                    1,
                    Culture,
                    "Tribal Museum Experience",
                    "Ranchi",
                    "Explore rich tribal heritage and traditional art forms.",
                    "2-3 hours",
                    800,
                    4.4,
                    "/tribal-museum-showcasing-jharkhand-tribal-artifact.jpg",
                ),
                stop(
                    4,
                    2,
                    Culture,
                    "Traditional Festival Experience",
                    "Local Village",
                    "Participate in authentic tribal festivals and cultural programs.",
                    "Full Day",
                    2500,
                    4.9,
                    "/tribal-festival-celebration-with-traditional-dance.jpg",
                ),
            ],
        )
        .with_pool(
            Adventure,
            vec![stop(
                5,
                1,
                Adventure,
                "Netarhat Hill Station Trek",
                "Latehar",
                "Sunrise trek to the Queen of Chotanagpur with breathtaking views.",
                "Full Day",
                3000,
                4.7,
                "/netarhat-hill-station-sunrise-view-over-rolling-hi.jpg",
            )],
        )
        .with_pool(
            Wildlife,
            vec![stop(
                6,
                1,
                Wildlife,
                "Betla National Park Safari",
                "Latehar",
                "Wildlife safari to spot tigers, elephants, and diverse fauna.",
                "Full Day",
                4000,
                4.8,
                "/betla-national-park-with-elephants-and-dense-fores.jpg",
            )],
        )
        .with_pool(
            Spiritual,
            vec![stop(
                7,
                1,
                Spiritual,
                "Baidyanath Temple Pilgrimage",
                "Deoghar",
                "Visit one of the twelve Jyotirlingas, a sacred pilgrimage site.",
                "Half Day",
                1000,
                4.9,
                "/baidyanath-temple-ancient-hindu-temple-with-devote.jpg",
            )],
        )
}
