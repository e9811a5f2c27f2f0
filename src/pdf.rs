use crate::models::TransformationConfig;
use printpdf::*;
use std::io::BufWriter;

const LINE_CHARS: usize = 95;
const LINES_PER_PAGE: usize = 52;

/// Text-only PDF of a style guide, to share outside the app.
pub fn generate_pdf(config: &TransformationConfig, guide: &str) -> Result<Vec<u8>, Error> {
    let (doc, first_page, first_layer) = PdfDocument::new("Seu Plano para Viralizar", Mm(210.0), Mm(297.0), "Layer 1");
    let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

    let header = doc.get_page(first_page).get_layer(first_layer);
    header.use_text("Seu Plano para Viralizar", 20.0, Mm(15.0), Mm(275.0), &bold);
    header.use_text(format!("Estilo: {}", config.style.label()), 10.0, Mm(15.0), Mm(263.0), &font);
    header.use_text(format!("Ritmo: {}", config.musical_style.label()), 10.0, Mm(15.0), Mm(257.0), &font);
    header.use_text(
        format!("Cenário: {}  |  Pose: {}", config.scenario.label(), config.pose.label()),
        10.0,
        Mm(15.0),
        Mm(251.0),
        &font,
    );
    if !config.accessories.is_empty() {
        header.use_text(format!("Acessórios: {}", config.accessories.join(", ")), 10.0, Mm(15.0), Mm(245.0), &font);
    }

    let lines = wrap(guide, LINE_CHARS);
    // The first page loses room to the header.
    let first_capacity = LINES_PER_PAGE - 10;
    let (head, rest) = lines.split_at(first_capacity.min(lines.len()));
    write_lines(&header, head, 235.0, &font);

    for (index, chunk) in rest.chunks(LINES_PER_PAGE).enumerate() {
        let (page, layer) = doc.add_page(Mm(210.0), Mm(297.0), format!("Página {}", index + 2));
        let layer_ref = doc.get_page(page).get_layer(layer);
        write_lines(&layer_ref, chunk, 280.0, &font);
    }

    let mut buf: Vec<u8> = Vec::new();
    {
        let mut writer = BufWriter::new(&mut buf);
        doc.save(&mut writer)?;
    }
    Ok(buf)
}

fn write_lines(layer: &PdfLayerReference, lines: &[String], top_mm: f32, font: &IndirectFontRef) {
    for (i, line) in lines.iter().enumerate() {
        layer.use_text(line.as_str(), 10.0, Mm(15.0), Mm(top_mm - 5.0 * i as f32), font);
    }
}

/// Greedy word wrap that keeps blank lines and leading indentation.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    for raw in text.lines() {
        let indent: String = raw.chars().take_while(|c| c.is_whitespace()).collect();
        let mut line = indent.clone();
        for word in raw.split_whitespace() {
            let len = line.chars().count();
            if len > indent.chars().count() && len + 1 + word.chars().count() > width {
                out.push(std::mem::replace(&mut line, indent.clone()));
            }
            if line.chars().count() > indent.chars().count() {
                line.push(' ');
            }
            line.push_str(word);
        }
        out.push(line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_keeps_structure() {
        let lines = wrap("## Look\n\n  - calça cargo bege com fivelas", 12);
        assert_eq!(lines[0], "## Look");
        assert_eq!(lines[1], "");
        assert!(lines[2].starts_with("  - "));
        assert!(lines.iter().all(|l| l.chars().count() <= 12 || !l.trim().contains(' ')));
    }

    #[test]
    fn produces_pdf_bytes_across_pages() {
        let guide = "linha de roteiro bem longa\n".repeat(200);
        let bytes = generate_pdf(&TransformationConfig::default(), &guide).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
