//! Static geography tables used when the open geography API is unreachable.
//!
//! Provinces are listed in plate-code order, so a province's id is its
//! position plus one. Districts are only known for İstanbul, Ankara and İzmir;
//! their ids are `province_id * 100 + position + 1`.

use crate::models::{Region, SubRegion};

const PROVINCES: [&str; 81] = [
    "Adana", "Adıyaman", "Afyonkarahisar", "Ağrı", "Amasya", "Ankara", "Antalya", "Artvin",
    "Aydın", "Balıkesir", "Bilecik", "Bingöl", "Bitlis", "Bolu", "Burdur", "Bursa",
    "Çanakkale", "Çankırı", "Çorum", "Denizli", "Diyarbakır", "Edirne", "Elazığ", "Erzincan",
    "Erzurum", "Eskişehir", "Gaziantep", "Giresun", "Gümüşhane", "Hakkari", "Hatay", "Isparta",
    "Mersin", "İstanbul", "İzmir", "Kars", "Kastamonu", "Kayseri", "Kırklareli", "Kırşehir",
    "Kocaeli", "Konya", "Kütahya", "Malatya", "Manisa", "Kahramanmaraş", "Mardin", "Muğla",
    "Muş", "Nevşehir", "Niğde", "Ordu", "Rize", "Sakarya", "Samsun", "Siirt",
    "Sinop", "Sivas", "Tekirdağ", "Tokat", "Trabzon", "Tunceli", "Şanlıurfa", "Uşak",
    "Van", "Yozgat", "Zonguldak", "Aksaray", "Bayburt", "Karaman", "Kırıkkale", "Batman",
    "Şırnak", "Bartın", "Ardahan", "Iğdır", "Yalova", "Karabük", "Kilis", "Osmaniye", "Düzce",
];

const ISTANBUL: [&str; 34] = [
    "Adalar", "Avcılar", "Bağcılar", "Bahçelievler", "Bakırköy", "Bayrampaşa", "Beşiktaş",
    "Beykoz", "Beyoğlu", "Büyükçekmece", "Çatalca", "Esenler", "Esenyurt", "Eyüpsultan",
    "Fatih", "Gaziosmanpaşa", "Güngören", "Kadıköy", "Kağıthane", "Kartal", "Küçükçekmece",
    "Maltepe", "Pendik", "Sancaktepe", "Sarıyer", "Silivri", "Sultanbeyli", "Sultangazi",
    "Şile", "Şişli", "Tuzla", "Ümraniye", "Üsküdar", "Zeytinburnu",
];

const ANKARA: [&str; 16] = [
    "Altındağ", "Ayaş", "Bala", "Beypazarı", "Çamlıdere", "Çankaya", "Çubuk", "Elmadağ",
    "Güdül", "Haymana", "Kalecik", "Kızılcahamam", "Nallıhan", "Polatlı", "Şereflikoçhisar",
    "Yenimahalle",
];

const IZMIR: [&str; 19] = [
    "Aliağa", "Bayındır", "Bergama", "Bornova", "Çeşme", "Dikili", "Foça", "Karaburun",
    "Karşıyaka", "Kemalpaşa", "Kınık", "Kiraz", "Menemen", "Ödemiş", "Seferihisar", "Selçuk",
    "Tire", "Torbalı", "Urla",
];

/// Highest valid province id.
pub const PROVINCE_COUNT: i32 = PROVINCES.len() as i32;

pub fn fallback_regions() -> Vec<Region> {
    PROVINCES
        .iter()
        .zip(1..)
        .map(|(name, id)| Region {
            id,
            name: (*name).to_string(),
        })
        .collect()
}

/// Districts for a province; empty for provinces without a static table.
pub fn fallback_sub_regions(region_id: i32) -> Vec<SubRegion> {
    let names: &[&str] = match region_id {
        34 => &ISTANBUL,
        6 => &ANKARA,
        35 => &IZMIR,
        _ => &[],
    };

    names
        .iter()
        .zip(1..)
        .map(|(name, position)| SubRegion {
            id: region_id * 100 + position,
            name: (*name).to_string(),
            region_id,
        })
        .collect()
}

/// Province name for an id, from the static table.
pub fn region_name(region_id: i32) -> Option<&'static str> {
    usize::try_from(region_id)
        .ok()
        .and_then(|id| id.checked_sub(1))
        .and_then(|index| PROVINCES.get(index))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_provinces_in_plate_order() {
        let regions = fallback_regions();
        assert_eq!(regions.len(), 81);
        assert_eq!(regions[0].name, "Adana");
        assert_eq!(region_name(34), Some("İstanbul"));
        assert_eq!(region_name(81), Some("Düzce"));
        assert_eq!(region_name(0), None);
        assert_eq!(region_name(82), None);
    }

    #[test]
    fn istanbul_has_34_districts_with_derived_ids() {
        let districts = fallback_sub_regions(34);
        assert_eq!(districts.len(), 34);
        assert_eq!(districts[0].id, 3401);
        assert_eq!(districts[0].name, "Adalar");
        assert!(districts.iter().all(|d| d.region_id == 34));
    }

    #[test]
    fn partial_table_for_other_provinces() {
        assert_eq!(fallback_sub_regions(6).len(), 16);
        assert_eq!(fallback_sub_regions(35).len(), 19);
        assert!(fallback_sub_regions(1).is_empty());
    }
}
