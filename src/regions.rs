use crate::models::fold_upper;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Geographic region of Turkey, as used for the output `region` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "MARMARA")]
    Marmara,
    #[serde(rename = "EGE")]
    Ege,
    #[serde(rename = "AKDENIZ")]
    Akdeniz,
    #[serde(rename = "IC ANADOLU")]
    IcAnadolu,
    #[serde(rename = "KARADENIZ")]
    Karadeniz,
    #[serde(rename = "DOGU ANADOLU")]
    DoguAnadolu,
    #[serde(rename = "GUNEYDOGU")]
    Guneydogu,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Marmara => "MARMARA",
            Region::Ege => "EGE",
            Region::Akdeniz => "AKDENIZ",
            Region::IcAnadolu => "IC ANADOLU",
            Region::Karadeniz => "KARADENIZ",
            Region::DoguAnadolu => "DOGU ANADOLU",
            Region::Guneydogu => "GUNEYDOGU",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const PROVINCES: &[(Region, &[&str])] = &[
    (
        Region::Marmara,
        &[
            "BALIKESİR", "BİLECİK", "BURSA", "ÇANAKKALE", "EDİRNE", "İSTANBUL", "KIRKLARELİ",
            "KOCAELİ", "SAKARYA", "TEKİRDAĞ", "YALOVA",
        ],
    ),
    (
        Region::Ege,
        &["AFYONKARAHİSAR", "AYDIN", "DENİZLİ", "İZMİR", "MANİSA", "MUĞLA", "KÜTAHYA", "UŞAK"],
    ),
    (
        Region::Akdeniz,
        &[
            "ADANA", "ANTALYA", "BURDUR", "HATAY", "ISPARTA", "MERSİN", "OSMANİYE", "KAHRAMANMARAŞ",
        ],
    ),
    (
        Region::IcAnadolu,
        &[
            "ANKARA", "AKSARAY", "ÇANKIRI", "ESKİŞEHİR", "KAYSERİ", "KIRIKKALE", "KIRŞEHİR",
            "KONYA", "NEVŞEHİR", "NİĞDE", "SİVAS", "YOZGAT", "KARAMAN",
        ],
    ),
    (
        Region::Karadeniz,
        &[
            "AMASYA", "ARTVİN", "BARTIN", "BAYBURT", "BOLU", "ÇORUM", "DÜZCE", "GİRESUN",
            "GÜMÜŞHANE", "KASTAMONU", "ORDU", "RİZE", "SAMSUN", "SİNOP", "TOKAT", "TRABZON",
            "ZONGULDAK", "KARABÜK",
        ],
    ),
    (
        Region::DoguAnadolu,
        &[
            "AĞRI", "BİNGÖL", "BİTLİS", "ELAZIĞ", "ERZİNCAN", "ERZURUM", "HAKKARİ", "KARS",
            "MALATYA", "MUŞ", "TUNCELİ", "VAN", "ARDAHAN", "IĞDIR",
        ],
    ),
    (
        Region::Guneydogu,
        &[
            "ADIYAMAN", "BATMAN", "DİYARBAKIR", "GAZİANTEP", "KİLİS", "MARDİN", "SİİRT",
            "ŞANLIURFA", "ŞIRNAK",
        ],
    ),
];

// Keyed by folded province name so lookups ignore case and accents.
static REGION_BY_PROVINCE: Lazy<HashMap<String, Region>> = Lazy::new(|| {
    PROVINCES
        .iter()
        .flat_map(|(region, provinces)| {
            provinces
                .iter()
                .map(move |province| (fold_upper(province), *region))
        })
        .collect()
});

pub fn region_for_city(city: &str) -> Option<Region> {
    REGION_BY_PROVINCE.get(&fold_upper(city.trim())).copied()
}
