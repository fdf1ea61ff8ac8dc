use crate::core::geo::TileCoord;
use crate::{MapError, Result};

/// Trait representing anything that can produce tile URLs for a given coordinate.
pub trait TileSource: Send + Sync {
    /// Build a URL for the requested `coord`.
    fn url(&self, coord: TileCoord) -> String;

    /// Highest zoom level the source publishes.
    fn max_zoom(&self) -> u8 {
        19
    }
}

/// Tile source addressed by an `{z}/{x}/{y}` URL template.
///
/// A `{a-c}` placeholder is expanded to the subdomains `a`, `b`, `c`, and a
/// bare `{s}` gets the same three. The subdomain used for a tile is picked
/// deterministically from its position.
#[derive(Debug, Clone, PartialEq)]
pub struct XyzSource {
    template: String,
    subdomains: Vec<String>,
    max_zoom: u8,
}

impl XyzSource {
    pub fn new(template: &str, max_zoom: u8) -> Result<Self> {
        for placeholder in ["{z}", "{x}", "{y}"] {
            if !template.contains(placeholder) {
                return Err(MapError::Config(format!(
                    "tile template '{}' is missing {}",
                    template, placeholder
                )));
            }
        }

        let (template, mut subdomains) = expand_subdomain_range(template)?;
        if subdomains.is_empty() && template.contains("{s}") {
            subdomains = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        }
        Ok(Self {
            template,
            subdomains,
            max_zoom,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn subdomains(&self) -> &[String] {
        &self.subdomains
    }
}

impl TileSource for XyzSource {
    fn url(&self, coord: TileCoord) -> String {
        let url = self
            .template
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string());

        if self.subdomains.is_empty() {
            return url;
        }
        let idx = ((coord.x as usize) + (coord.y as usize)) % self.subdomains.len();
        url.replace("{s}", &self.subdomains[idx])
    }

    fn max_zoom(&self) -> u8 {
        self.max_zoom
    }
}

/// Rewrites a `{a-c}` style range into `{s}` and returns the letters it covers.
fn expand_subdomain_range(template: &str) -> Result<(String, Vec<String>)> {
    let Some(start) = template.find('{') else {
        return Ok((template.to_string(), Vec::new()));
    };

    let mut search_from = start;
    while let Some(rel_open) = template[search_from..].find('{') {
        let open = search_from + rel_open;
        let Some(rel_close) = template[open..].find('}') else {
            break;
        };
        let close = open + rel_close;
        let inner = &template[open + 1..close];

        let bytes = inner.as_bytes();
        if bytes.len() == 3 && bytes[1] == b'-' {
            let (first, last) = (bytes[0], bytes[2]);
            if !first.is_ascii_alphanumeric() || !last.is_ascii_alphanumeric() || first > last {
                return Err(MapError::Config(format!(
                    "invalid subdomain range '{{{}}}' in '{}'",
                    inner, template
                )));
            }
            let subdomains = (first..=last).map(|b| (b as char).to_string()).collect();
            let rewritten = format!("{}{{s}}{}", &template[..open], &template[close + 1..]);
            return Ok((rewritten, subdomains));
        }
        search_from = close + 1;
    }

    Ok((template.to_string(), Vec::new()))
}
