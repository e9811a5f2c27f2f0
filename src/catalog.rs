use serde::{Deserialize, Serialize};

use crate::models::TransformationConfig;

/// Clothing base the stylist works from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClothingStyle {
    Urban,
    Influencer,
    Sporty,
    Viral,
}

impl ClothingStyle {
    pub const ALL: [ClothingStyle; 4] = [Self::Urban, Self::Influencer, Self::Sporty, Self::Viral];

    pub fn label(self) -> &'static str {
        match self {
            Self::Urban => "Casual Urbano (Moletom, Cropped, Jeans)",
            Self::Influencer => "Estilo Influenciador (Vestido, Blazer)",
            Self::Sporty => "Esportivo (Legging, Top Esportivo)",
            Self::Viral => "Mix de Cores e Tendências Virais",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MusicalStyle {
    None,
    Sertanejo,
    Vaquejada,
    Funk,
    Rock,
    Kpop,
}

impl MusicalStyle {
    pub const ALL: [MusicalStyle; 6] = [
        Self::None,
        Self::Sertanejo,
        Self::Vaquejada,
        Self::Funk,
        Self::Rock,
        Self::Kpop,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::None => "Nenhum / Estilo Livre",
            Self::Sertanejo => "Sertanejo (Bota, Fivela, Chapéu)",
            Self::Vaquejada => "Vaquejada (Jeans, Botas, Couro)",
            Self::Funk => "Funk (Ouro, Grife, Óculos Juliet)",
            Self::Rock => "Rock / Alternativo",
            Self::Kpop => "K-Pop Aesthetic",
        }
    }

    /// Extra visual directives a musical influence adds to the transform prompt,
    /// in the order they are rendered.
    pub fn directives(self) -> &'static [&'static str] {
        match self {
            Self::Sertanejo | Self::Vaquejada => &[COUNTRY_DIRECTIVE],
            Self::Funk => &[FUNK_DIRECTIVE],
            Self::None | Self::Rock | Self::Kpop => &[],
        }
    }
}

const COUNTRY_DIRECTIVE: &str =
    "Inclua botas de couro de cano alto, cinto com fivela grande e detalhes em couro legítimo.";
const FUNK_DIRECTIVE: &str =
    "Aplique a estética do funk: correntes e joias de ouro chamativas, peças de grife e visual urbano ostentação.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    Room,
    Street,
    Studio,
    Bokeh,
    Festival,
}

impl Scenario {
    pub const ALL: [Scenario; 5] = [
        Self::Room,
        Self::Street,
        Self::Studio,
        Self::Bokeh,
        Self::Festival,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Room => "Quarto Moderno / Hotel",
            Self::Street => "Rua Urbana Estilizada",
            Self::Studio => "Estúdio com Iluminação TikTok",
            Self::Bokeh => "Fundo Desfocado (Bokeh)",
            Self::Festival => "Festival de Música / Palco",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pose {
    Dance,
    Smile,
    Hair,
    Sitting,
}

impl Pose {
    pub const ALL: [Pose; 4] = [Self::Dance, Self::Smile, Self::Hair, Self::Sitting];

    pub fn label(self) -> &'static str {
        match self {
            Self::Dance => "Pose de Dança Expressiva",
            Self::Smile => "Sorriso e Olhar para Câmera",
            Self::Hair => "Movimento de Cabelo",
            Self::Sitting => "Sentada / Descontraída",
        }
    }
}

/// Accessories offered as toggle chips. The accessory set itself stays open.
pub const SUGGESTED_ACCESSORIES: [&str; 5] = [
    "Óculos Juliet",
    "Corrente de Ouro",
    "Chapéu Boiadeiro",
    "Fone Gamer",
    "Shoulder Bag",
];

pub const DEFAULT_ACCESSORIES: [&str; 2] = ["Óculos de sol", "Brincos"];

#[derive(Debug, Clone, Serialize)]
pub struct OptionEntry<T> {
    pub value: T,
    pub label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptionCatalog {
    pub styles: Vec<OptionEntry<ClothingStyle>>,
    pub musical_styles: Vec<OptionEntry<MusicalStyle>>,
    pub scenarios: Vec<OptionEntry<Scenario>>,
    pub poses: Vec<OptionEntry<Pose>>,
    pub accessories: Vec<&'static str>,
    pub defaults: TransformationConfig,
}

pub fn option_catalog() -> OptionCatalog {
    OptionCatalog {
        styles: ClothingStyle::ALL.iter().map(|&value| OptionEntry { value, label: value.label() }).collect(),
        musical_styles: MusicalStyle::ALL.iter().map(|&value| OptionEntry { value, label: value.label() }).collect(),
        scenarios: Scenario::ALL.iter().map(|&value| OptionEntry { value, label: value.label() }).collect(),
        poses: Pose::ALL.iter().map(|&value| OptionEntry { value, label: value.label() }).collect(),
        accessories: SUGGESTED_ACCESSORIES.to_vec(),
        defaults: TransformationConfig::default(),
    }
}
