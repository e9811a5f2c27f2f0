use crate::catalog::MusicalStyle;
use crate::models::{GenerationMode, TransformationConfig};

pub const MUSICAL_CLAUSE_MARKER: &str = "INFLUÊNCIA MUSICAL:";

pub fn compose(config: &TransformationConfig, mode: GenerationMode) -> String {
    match mode {
        GenerationMode::Analyze => analyze_prompt(config),
        GenerationMode::Transform => transform_prompt(config),
    }
}

fn accessory_list(config: &TransformationConfig) -> String {
    config.accessories.join(", ")
}

fn analyze_prompt(config: &TransformationConfig) -> String {
    let accessories = if config.accessories.is_empty() {
        "Nenhum".to_string()
    } else {
        accessory_list(config)
    };
    let scenario = config.scenario.label();
    format!(
        "Analise esta foto e crie um ROTEIRO DE ESTILO VIRAL para o TikTok.\n\
         ESTILO ESCOLHIDO: {style}\n\
         {MUSICAL_CLAUSE_MARKER} {musical}\n\
         CENÁRIO: {scenario}\n\
         POSE SUGERIDA: {pose}\n\
         ACESSÓRIOS: {accessories}\n\
         \n\
         Responda em Markdown estruturado:\n\
         1. **Análise de Biotipo**: O que combina com a pessoa da foto.\n\
         2. **O Look Ideal**: Descreva peça por peça (ex: 'Calça cargo bege com fivelas').\n\
         3. **Dica de Iluminação**: Como usar o cenário {scenario}.\n\
         4. **Legenda Viral**: Sugira 2 legendas com hashtags.\n\
         5. **Dica de Áudio**: Que tipo de música usar.\n\
         \n\
         Seja muito criativo, jovem e use gírias de TikTok.",
        style = config.style.label(),
        musical = config.musical_style.label(),
        pose = config.pose.label(),
    )
}

fn transform_prompt(config: &TransformationConfig) -> String {
    let mut lines = vec![
        "Gere uma nova versão fotorrealista desta foto para um vídeo viral do TikTok.".to_string(),
        "Preserve EXATAMENTE a identidade facial e as características físicas da pessoa (rosto, tom de pele, cabelo, tipo de corpo).".to_string(),
        format!("ROUPA: vista a pessoa no estilo {}.", config.style.label()),
    ];

    if config.musical_style != MusicalStyle::None {
        lines.push(format!(
            "{MUSICAL_CLAUSE_MARKER} incorpore a estética {} ao visual.",
            config.musical_style.label()
        ));
    }
    lines.extend(config.musical_style.directives().iter().map(|d| d.to_string()));

    lines.push(format!("CENÁRIO: troque o fundo por {}.", config.scenario.label()));
    lines.push(format!("POSE: ajuste a pose para {}.", config.pose.label()));
    if !config.accessories.is_empty() {
        lines.push(format!("ACESSÓRIOS: adicione {}.", accessory_list(config)));
    }
    lines.push("Iluminação profissional, alta resolução, aparência de foto real, sem texto sobre a imagem.".to_string());

    lines.join("\n")
}
