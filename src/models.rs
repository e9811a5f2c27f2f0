use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::catalog::{ClothingStyle, MusicalStyle, Pose, Scenario, DEFAULT_ACCESSORIES};

/// The user's current selections. Updates consume the value and hand back a new one.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TransformationConfig {
    pub style: ClothingStyle,
    pub musical_style: MusicalStyle,
    pub scenario: Scenario,
    pub pose: Pose,
    pub accessories: Vec<String>,
}

impl Default for TransformationConfig {
    fn default() -> Self {
        Self {
            style: ClothingStyle::Urban,
            musical_style: MusicalStyle::None,
            scenario: Scenario::Room,
            pose: Pose::Dance,
            accessories: DEFAULT_ACCESSORIES.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl TransformationConfig {
    pub fn apply(self, update: ConfigUpdate) -> Self {
        Self {
            style: update.style.unwrap_or(self.style),
            musical_style: update.musical_style.unwrap_or(self.musical_style),
            scenario: update.scenario.unwrap_or(self.scenario),
            pose: update.pose.unwrap_or(self.pose),
            accessories: self.accessories,
        }
    }

    /// Removes `label` when present, appends it otherwise.
    pub fn toggle_accessory(mut self, label: &str) -> Self {
        if let Some(pos) = self.accessories.iter().position(|a| a == label) {
            self.accessories.remove(pos);
        } else {
            self.accessories.push(label.to_string());
        }
        self
    }
}

/// Partial replacement of the singular fields; absent fields are kept.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ConfigUpdate {
    #[serde(default)]
    pub style: Option<ClothingStyle>,
    #[serde(default)]
    pub musical_style: Option<MusicalStyle>,
    #[serde(default)]
    pub scenario: Option<Scenario>,
    #[serde(default)]
    pub pose: Option<Pose>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToggleAccessoryRequest {
    pub label: String,
}

/// An image held in memory as media type plus base64 payload.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime_type: String,
    pub data: String,
}

impl EncodedImage {
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Splits a `data:<mime>;base64,<payload>` URI. The payload must be non-empty standard base64.
    pub fn parse_data_uri(uri: &str) -> Option<Self> {
        let rest = uri.strip_prefix("data:")?;
        let (header, data) = rest.split_once(',')?;
        let mime_type = header.strip_suffix(";base64")?;
        if mime_type.is_empty() || data.is_empty() {
            return None;
        }
        base64::engine::general_purpose::STANDARD.decode(data).ok()?;
        Some(Self { mime_type: mime_type.to_string(), data: data.to_string() })
    }

    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        base64::engine::general_purpose::STANDARD.decode(&self.data)
    }

    pub fn file_extension(&self) -> &'static str {
        image::ImageFormat::from_mime_type(&self.mime_type)
            .and_then(|format| format.extensions_str().first().copied())
            .unwrap_or("bin")
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Text style guide.
    Analyze,
    /// Regenerated photo.
    Transform,
}

impl GenerationMode {
    pub fn error_label(self) -> &'static str {
        match self {
            Self::Analyze => "Erro na consultoria",
            Self::Transform => "Erro na transformação",
        }
    }

    pub fn loading_message(self) -> &'static str {
        match self {
            Self::Analyze => "IA Analisando seu potencial viral...",
            Self::Transform => "IA criando seu novo visual...",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult {
    Text(String),
    Image(EncodedImage),
}

/// Presenter form of a result, as the page consumes it.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultView {
    Text { markdown: String },
    Image { mime_type: String, src: String, download_url: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config_matches_startup_selection() {
        let config = TransformationConfig::default();
        assert_eq!(config.style, ClothingStyle::Urban);
        assert_eq!(config.musical_style, MusicalStyle::None);
        assert_eq!(config.scenario, Scenario::Room);
        assert_eq!(config.pose, Pose::Dance);
        assert_eq!(config.accessories, vec!["Óculos de sol".to_string(), "Brincos".to_string()]);
    }

    #[test]
    fn double_toggle_restores_accessories() {
        let original = TransformationConfig::default();
        for label in ["Fone Gamer", "Brincos"] {
            let back = original.clone().toggle_accessory(label).toggle_accessory(label);
            let mut a = back.accessories.clone();
            let mut b = original.accessories.clone();
            a.sort();
            b.sort();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn toggle_never_duplicates() {
        let config = TransformationConfig::default().toggle_accessory("Fone Gamer");
        assert!(config.accessories.contains(&"Fone Gamer".to_string()));
        assert_eq!(config.accessories.iter().filter(|a| *a == "Fone Gamer").count(), 1);
        let config = config.toggle_accessory("Fone Gamer");
        assert!(!config.accessories.contains(&"Fone Gamer".to_string()));
    }

    #[test]
    fn partial_update_keeps_other_fields() {
        let config = TransformationConfig::default().apply(ConfigUpdate {
            musical_style: Some(MusicalStyle::Funk),
            ..Default::default()
        });
        assert_eq!(config.musical_style, MusicalStyle::Funk);
        assert_eq!(config.style, ClothingStyle::Urban);
        assert_eq!(config.accessories.len(), 2);
    }

    #[test]
    fn data_uri_parsing() {
        let img = EncodedImage::parse_data_uri("data:image/png;base64,QQ==").unwrap();
        assert_eq!(img, EncodedImage { mime_type: "image/png".into(), data: "QQ==".into() });
        assert_eq!(img.data_uri(), "data:image/png;base64,QQ==");
        assert_eq!(img.decode().unwrap(), b"A".to_vec());
        assert!(EncodedImage::parse_data_uri("data:;base64,QQ==").is_none());
        assert!(EncodedImage::parse_data_uri("image/png;base64,QQ==").is_none());
        assert!(EncodedImage::parse_data_uri("data:image/png;base64,").is_none());
        let odd = format!("data:image/png;base64,a{}", "ã".repeat(60));
        assert!(EncodedImage::parse_data_uri(&odd).is_none());
        assert!(EncodedImage::parse_data_uri("data:image/png;base64,QQ=").is_none());
    }

    #[test]
    fn extension_follows_media_type() {
        assert_eq!(EncodedImage::from_bytes("image/png", b"x").file_extension(), "png");
        assert_eq!(EncodedImage::from_bytes("image/jpeg", b"x").file_extension(), "jpg");
        assert_eq!(EncodedImage::from_bytes("application/octet-stream", b"x").file_extension(), "bin");
    }
}
