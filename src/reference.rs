//! Lookup lists for the profile forms: occupations, sectors and banks.

use crate::models::LookupItem;
use std::path::Path;

/// Banks offered on the income form. The value saved upstream is the name itself.
pub const BANKS: [&str; 20] = [
    "Ziraat Bankası",
    "İş Bankası",
    "Garanti BBVA",
    "Akbank",
    "Yapı Kredi",
    "Halkbank",
    "Vakıfbank",
    "Denizbank",
    "QNB Finansbank",
    "TEB",
    "ING Bank",
    "HSBC",
    "Şekerbank",
    "Türkiye Finans",
    "Albaraka Türk",
    "Kuveyt Türk",
    "Ziraat Katılım",
    "Vakıf Katılım",
    "Türkiye Emlak Katılım",
    "Diğer",
];

/// Occupation and sector lists, read once at startup.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub occupations: Vec<LookupItem>,
    pub sectors: Vec<LookupItem>,
}

impl ReferenceData {
    /// Reads `job_id.json` and `sektor_id.json` from `dir`.
    ///
    /// A missing or malformed file leaves that list empty; the forms still work.
    pub fn load(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let data = Self {
            occupations: load_list(&dir.join("job_id.json")),
            sectors: load_list(&dir.join("sektor_id.json")),
        };
        tracing::info!(
            "Reference data loaded: {} occupations, {} sectors",
            data.occupations.len(),
            data.sectors.len()
        );
        data
    }

    pub fn occupation_name(&self, id: i32) -> Option<&str> {
        self.occupations
            .iter()
            .find(|item| item.id == id)
            .map(|item| item.name.as_str())
    }

    pub fn sector_name(&self, id: i32) -> Option<&str> {
        self.sectors
            .iter()
            .find(|item| item.id == id)
            .map(|item| item.name.as_str())
    }
}

pub fn is_known_bank(name: &str) -> bool {
    BANKS.contains(&name.trim())
}

fn load_list(path: &Path) -> Vec<LookupItem> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("Could not read {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<LookupItem>>(&content) {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!("Could not parse {}: {}", path.display(), e);
            Vec::new()
        }
    }
}
