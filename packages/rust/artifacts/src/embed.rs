//! Standalone embedding: inline a chart document into a rendering template.
//!
//! The template loads its data with one runtime call, the *marker* (by
//! default `fetch('data.json').then((response) => response.json())`). The
//! marker is replaced with `Promise.resolve(<document>)`, which hands the
//! template's continuation the same value the fetch would have, with no
//! network or file access. Every other template byte is kept.

use std::path::PathBuf;

use tracing::{info, instrument};

use modelcharts_shared::{ChartDocument, ModelChartsError, Result};

use crate::DEFAULT_TEMPLATE;
use crate::write::{ArtifactMeta, write_atomic};

const LITERAL_OPEN: &str = "Promise.resolve(";
const LITERAL_CLOSE: &str = ")";

/// A rendering document with its chart data inlined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandaloneArtifact {
    pub html: String,
    /// Size of the inlined document literal.
    pub document_bytes: usize,
}

/// Inline `document` into `template` at the single occurrence of `marker`.
pub fn embed(
    document: &ChartDocument,
    template: &str,
    marker: &str,
) -> Result<StandaloneArtifact> {
    let at = locate_marker(template, marker)?;
    let literal = script_safe(&document.to_canonical_json()?);

    let mut html = String::with_capacity(
        template.len() - marker.len() + LITERAL_OPEN.len() + literal.len() + LITERAL_CLOSE.len(),
    );
    html.push_str(&template[..at]);
    html.push_str(LITERAL_OPEN);
    html.push_str(&literal);
    html.push_str(LITERAL_CLOSE);
    html.push_str(&template[at + marker.len()..]);

    Ok(StandaloneArtifact {
        html,
        document_bytes: literal.len(),
    })
}

/// Recover the chart document from an artifact produced by [`embed`] with
/// the same `template` and `marker`.
///
/// Fails if the template text around the marker was altered.
pub fn extract_embedded(artifact: &str, template: &str, marker: &str) -> Result<ChartDocument> {
    let at = locate_marker(template, marker)?;
    let prefix = &template[..at];
    let suffix = &template[at + marker.len()..];

    let inner = artifact
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_suffix(suffix))
        .ok_or_else(|| {
            ModelChartsError::embedding("artifact does not match the template around the marker")
        })?;

    let literal = inner
        .strip_prefix(LITERAL_OPEN)
        .and_then(|rest| rest.strip_suffix(LITERAL_CLOSE))
        .ok_or_else(|| ModelChartsError::embedding("artifact has no inlined document"))?;

    // `\u003c` is a valid JSON escape for `<`, so the literal parses as-is.
    ChartDocument::from_json(literal)
}

/// Byte offset of the only occurrence of `marker` in `template`.
fn locate_marker(template: &str, marker: &str) -> Result<usize> {
    if marker.is_empty() {
        return Err(ModelChartsError::embedding("embed marker is empty"));
    }
    let mut found = template.match_indices(marker).map(|(i, _)| i);
    match (found.next(), found.next()) {
        (Some(at), None) => Ok(at),
        (None, _) => Err(ModelChartsError::embedding(format!(
            "marker {marker:?} not found in template"
        ))),
        (Some(_), Some(_)) => Err(ModelChartsError::embedding(format!(
            "marker {marker:?} appears {} times in template; expected exactly one",
            template.matches(marker).count()
        ))),
    }
}

/// Write every `<` as `\u003c` so no string value can open a comment or a
/// script tag, or close the enclosing script element.
fn script_safe(json: &str) -> String {
    json.replace('<', "\\u003c")
}

// ---------------------------------------------------------------------------
// File-level workflow
// ---------------------------------------------------------------------------

/// Inputs of one `embed` run.
#[derive(Debug, Clone)]
pub struct EmbedRequest {
    /// Chart document (`data.json`) produced by `extract`.
    pub document_path: PathBuf,
    /// Rendering template containing the marker; the stock template if `None`.
    pub template_path: Option<PathBuf>,
    /// Where the standalone artifact is written.
    pub output_path: PathBuf,
    pub marker: String,
}

/// Summary of a completed embed run.
#[derive(Debug, Clone)]
pub struct EmbedResult {
    pub artifact: ArtifactMeta,
    pub output_path: PathBuf,
    pub template_bytes: usize,
    pub document_bytes: usize,
    pub total_models: usize,
}

/// Read the document and template, embed, verify the artifact reproduces the
/// document, then write it atomically.
#[instrument(skip_all, fields(document = %request.document_path.display()))]
pub fn run_embed(request: &EmbedRequest) -> Result<EmbedResult> {
    let document_json = std::fs::read_to_string(&request.document_path)
        .map_err(|e| ModelChartsError::io(&request.document_path, e))?;
    let template = match &request.template_path {
        Some(path) => std::fs::read_to_string(path).map_err(|e| ModelChartsError::io(path, e))?,
        None => DEFAULT_TEMPLATE.to_string(),
    };

    let document = ChartDocument::from_json(&document_json)?;
    let artifact = embed(&document, &template, &request.marker)?;

    let recovered = extract_embedded(&artifact.html, &template, &request.marker)?;
    if recovered != document {
        return Err(ModelChartsError::embedding(
            "embedded document does not round-trip to the source document",
        ));
    }

    let meta = write_atomic(&request.output_path, &artifact.html)?;

    info!(
        output = %request.output_path.display(),
        total_models = document.total_models,
        size = meta.size_bytes,
        "standalone artifact written"
    );

    Ok(EmbedResult {
        artifact: meta,
        output_path: request.output_path.clone(),
        template_bytes: template.len(),
        document_bytes: artifact.document_bytes,
        total_models: document.total_models,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelcharts_shared::{
        AxisRange, ChartPoint, DEFAULT_EMBED_MARKER, DomainCount, EraCounts, Series,
    };

    fn document(name: &str) -> ChartDocument {
        ChartDocument {
            total_models: 1,
            domains: vec!["Language".into()],
            series: vec![Series {
                name: "Language".into(),
                kind: "scatter".into(),
                data: vec![ChartPoint {
                    value: [9.0, 12.0],
                    name: name.into(),
                    organization: "Org".into(),
                    parameters: 1e9,
                    training_dataset_size_datapoints: Some(1e12),
                    publication_date: "2020-01-01".into(),
                    confidence: "Confident".into(),
                    frontier_model: None,
                }],
            }],
            x_axis: AxisRange { min: 8.0, max: 10.0 },
            y_axis: AxisRange { min: 11.0, max: 13.0 },
            domain_counts: vec![DomainCount {
                domain: "Language".into(),
                count: 1,
            }],
            era_counts: EraCounts {
                era3: 1,
                ..Default::default()
            },
        }
    }

    fn template() -> String {
        format!(
            "<html><body><div id=\"chart\"></div>\n<script>\n{DEFAULT_EMBED_MARKER}\n  .then((data) => render(data));\n</script></body></html>\n"
        )
    }

    #[test]
    fn replaces_marker_and_keeps_surroundings() {
        let tpl = template();
        let artifact = embed(&document("A"), &tpl, DEFAULT_EMBED_MARKER).unwrap();

        assert!(!artifact.html.contains("fetch("));
        assert!(artifact.html.starts_with("<html><body><div id=\"chart\"></div>\n<script>\nPromise.resolve({"));
        assert!(artifact.html.ends_with("})\n  .then((data) => render(data));\n</script></body></html>\n"));
    }

    #[test]
    fn round_trips_document() {
        let tpl = template();
        let doc = document("A");
        let artifact = embed(&doc, &tpl, DEFAULT_EMBED_MARKER).unwrap();
        let back = extract_embedded(&artifact.html, &tpl, DEFAULT_EMBED_MARKER).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn script_terminator_in_data_is_escaped() {
        let tpl = template();
        let doc = document("evil</script><script>alert(1)");
        let artifact = embed(&doc, &tpl, DEFAULT_EMBED_MARKER).unwrap();

        assert_eq!(artifact.html.matches("</script>").count(), 1);
        let back = extract_embedded(&artifact.html, &tpl, DEFAULT_EMBED_MARKER).unwrap();
        assert_eq!(back.series[0].data[0].name, "evil</script><script>alert(1)");
    }

    #[test]
    fn comment_opener_in_data_cannot_swallow_closing_tag() {
        let tpl = template();
        let doc = document("x<!--<script>y");
        let artifact = embed(&doc, &tpl, DEFAULT_EMBED_MARKER).unwrap();

        let (_, literal_and_rest) = artifact.html.split_once("Promise.resolve(").unwrap();
        let (literal, _) = literal_and_rest.split_once("\n  .then(").unwrap();
        assert!(!literal.contains('<'));
        assert!(literal.contains("x\\u003c!--\\u003cscript>y"));
        assert!(artifact.html.ends_with("</script></body></html>\n"));

        let back = extract_embedded(&artifact.html, &tpl, DEFAULT_EMBED_MARKER).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn missing_marker_is_embedding_error() {
        let err = embed(&document("A"), "<html></html>", DEFAULT_EMBED_MARKER).unwrap_err();
        assert_eq!(err.kind(), "EmbeddingError");
    }

    #[test]
    fn duplicate_marker_is_embedding_error() {
        let tpl = format!("{DEFAULT_EMBED_MARKER};{DEFAULT_EMBED_MARKER}");
        let err = embed(&document("A"), &tpl, DEFAULT_EMBED_MARKER).unwrap_err();
        assert_eq!(err.kind(), "EmbeddingError");
        assert!(err.to_string().contains("2 times"));
    }

    #[test]
    fn tampered_template_text_rejected() {
        let tpl = template();
        let artifact = embed(&document("A"), &tpl, DEFAULT_EMBED_MARKER).unwrap();
        let tampered = artifact.html.replace("render(data)", "draw(data)");
        let err = extract_embedded(&tampered, &tpl, DEFAULT_EMBED_MARKER).unwrap_err();
        assert_eq!(err.kind(), "EmbeddingError");
    }

    #[test]
    fn stock_template_has_one_marker() {
        assert_eq!(DEFAULT_TEMPLATE.matches(DEFAULT_EMBED_MARKER).count(), 1);
        let artifact = embed(&document("A"), DEFAULT_TEMPLATE, DEFAULT_EMBED_MARKER).unwrap();
        assert!(!artifact.html.contains("data.json"));
    }

    #[test]
    fn empty_series_still_embeds() {
        let doc = ChartDocument {
            total_models: 0,
            domains: vec![],
            series: vec![],
            domain_counts: vec![],
            era_counts: EraCounts::default(),
            ..document("A")
        };
        let tpl = template();
        let artifact = embed(&doc, &tpl, DEFAULT_EMBED_MARKER).unwrap();
        let back = extract_embedded(&artifact.html, &tpl, DEFAULT_EMBED_MARKER).unwrap();
        assert!(back.series.is_empty());
    }
}
