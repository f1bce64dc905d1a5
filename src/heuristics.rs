/// Services that get a popularity boost when their name appears in a title.
const POPULAR_SERVICES: &[&str] = &[
    "ec2", "s3", "lambda", "rds", "dynamodb", "vpc", "eks", "ecs", "kubernetes", "docker",
];

const CONTAINER_WIDTH: u32 = 128;
const STORAGE_WIDTH: u32 = 96;
const DEFAULT_WIDTH: u32 = 64;

const POPULAR: f32 = 1.0;
const REGULAR: f32 = 0.5;

/// Static lookup tables for width and popularity defaults.
#[derive(Debug, Clone)]
pub struct Heuristics {
    popular_services: Vec<String>,
}

impl Default for Heuristics {
    fn default() -> Self {
        Self::new(POPULAR_SERVICES.iter().map(|s| s.to_string()))
    }
}

impl Heuristics {
    pub fn new(popular_services: impl IntoIterator<Item = String>) -> Self {
        Self {
            popular_services: popular_services.into_iter().map(|s| s.to_lowercase()).collect(),
        }
    }

    /// Width keyed on the enrichment category.
    pub fn default_width(&self, category: &str) -> u32 {
        match category {
            "network" | "container" => CONTAINER_WIDTH,
            "storage" | "database" => STORAGE_WIDTH,
            _ => DEFAULT_WIDTH,
        }
    }

    pub fn popularity(&self, title: &str) -> f32 {
        let lower = title.to_lowercase();
        if self.popular_services.iter().any(|s| lower.contains(s.as_str())) {
            POPULAR
        } else {
            REGULAR
        }
    }
}
