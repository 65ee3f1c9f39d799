use std::fs;
use std::path::PathBuf;

use anyhow::Result;

use crate::core::geometry::Rect;
use crate::core::model::{PageReport, RegionOutcome};
use crate::export::Exporter;

/// Overlays flagged regions and removed node boxes in page coordinates.
#[derive(Debug, Clone)]
pub struct HtmlDebugExporter {
    out_dir: PathBuf,
}

impl HtmlDebugExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    fn rect_to_div(rect: &Rect, layer: &str, label: &str) -> String {
        format!(
            r#"<div class='bbox {layer}' style='left:{x0}px; top:{y0}px; width:{w}px; height:{h}px;' data-label='{label}'></div>"#,
            x0 = rect.left,
            y0 = rect.top,
            w = rect.width(),
            h = rect.height(),
            layer = layer,
            label = html_escape::encode_single_quoted_attribute(label),
        )
    }
}

fn outcome_label(index: usize, outcome: &RegionOutcome) -> String {
    match outcome {
        RegionOutcome::Removed { node, score, path, .. } => {
            format!("region {index}: removed node {} via {path:?} (score {score:.2})", node.0)
        }
        RegionOutcome::Filtered { reason } => format!("region {index}: filtered ({reason:?})"),
    }
}

impl Exporter for HtmlDebugExporter {
    fn export(&self, report: &PageReport) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;
        let scroll = report.viewport.scroll;

        let mut boxes_html = String::new();
        for (index, region) in report.regions.iter().enumerate() {
            let label = report
                .resolution
                .outcomes
                .get(index)
                .map(|outcome| outcome_label(index, outcome))
                .unwrap_or_else(|| format!("region {index}"));
            boxes_html.push_str(&HtmlDebugExporter::rect_to_div(&region.page_rect(), "region", &label));
        }
        for (index, outcome) in report.resolution.outcomes.iter().enumerate() {
            if let RegionOutcome::Removed { rect, .. } = outcome {
                let page_rect = rect.translate(scroll.x, scroll.y);
                boxes_html.push_str(&HtmlDebugExporter::rect_to_div(
                    &page_rect,
                    "removed",
                    &outcome_label(index, outcome),
                ));
            }
        }

        let title = report.url.as_deref().unwrap_or("page");
        let html = format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset='utf-8'>
<title>Ad resolution: {title}</title>
<style>
body {{ margin: 0; font-family: Arial, sans-serif; }}
#canvas {{ position: relative; width: {width}px; min-height: {height}px; background: #fafafa; }}
.bbox {{ position: absolute; border: 2px solid; box-sizing: border-box; }}
.bbox.region {{ border-color: rgba(255,0,0,0.6); background: rgba(255,0,0,0.08); }}
.bbox.removed {{ border-color: rgba(0,128,0,0.7); border-style: dashed; }}
#info {{ position: fixed; right: 10px; top: 10px; background: #fff; padding: 10px; border: 1px solid #ddd; max-width: 320px; }}
</style>
</head>
<body>
<div id='info'>removed: {removed}, filtered: {filtered}</div>
<div id='canvas'>
{boxes}
</div>
<script>
const info = document.getElementById('info');
for (const el of document.querySelectorAll('.bbox')) {{
  el.addEventListener('click', () => {{
    info.textContent = el.dataset.label;
  }});
}}
</script>
</body>
</html>"#,
            title = html_escape::encode_safe(title),
            width = report.viewport.width,
            height = report.viewport.height,
            removed = report.resolution.removed,
            filtered = report.resolution.filtered,
            boxes = boxes_html,
        );

        fs::write(self.out_dir.join("resolution.html"), html)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{AdRegion, FilterReason, RemovalPath, ResolutionReport, ScrollOffset};
    use crate::dom::{NodeId, Viewport};

    #[test]
    fn removed_boxes_are_shifted_back_to_page_space() -> Result<()> {
        let out_dir = std::env::temp_dir().join(format!("adsweep-html-{}", std::process::id()));
        let report = PageReport {
            url: Some("https://example.com/?a=1&b='2'".to_string()),
            viewport: Viewport {
                width: 1280.0,
                height: 800.0,
                scroll: ScrollOffset::new(0.0, 1000.0),
            },
            decisions: vec![],
            regions: vec![
                AdRegion {
                    page_x: 0.0,
                    page_y: 1100.0,
                    width: 300.0,
                    height: 250.0,
                    confidence: 0.8,
                },
                AdRegion {
                    page_x: 0.0,
                    page_y: 0.0,
                    width: 10.0,
                    height: 10.0,
                    confidence: 0.8,
                },
            ],
            resolution: ResolutionReport {
                removed: 1,
                filtered: 1,
                outcomes: vec![
                    RegionOutcome::Removed {
                        node: NodeId(4),
                        score: -20.0,
                        path: RemovalPath::Direct,
                        rect: Rect::from_origin(0.0, 100.0, 300.0, 250.0),
                    },
                    RegionOutcome::Filtered {
                        reason: FilterReason::NoCandidate,
                    },
                ],
            },
        };

        HtmlDebugExporter::new(out_dir.clone()).export(&report)?;
        let html = fs::read_to_string(out_dir.join("resolution.html"))?;

        assert!(html.contains("class='bbox removed' style='left:0px; top:1100px;"));
        assert!(html.contains("filtered (NoCandidate)"));
        assert!(html.contains("removed: 1, filtered: 1"));
        assert!(!html.contains("b='2'"));

        fs::remove_dir_all(&out_dir)?;
        Ok(())
    }
}
