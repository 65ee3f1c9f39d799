use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::info;

use crate::classify::{classify_all, TextClassifier};
use crate::config::Settings;
use crate::core::error::InputError;
use crate::core::model::{AdRegion, Detection, PageReport, ResolutionReport};
use crate::dom::RenderedTree;
use crate::export::{Exporter, HtmlDebugExporter, JsonExporter};
use crate::fusion::{regions, FusionEngine, TableFusionEngine};
use crate::resolve::{Resolver, ResolverConfig};

/// A region list plus the placeholder preference to resolve it with.
#[derive(Debug, Clone, Default)]
pub struct ResolveRequest {
    pub regions: Vec<AdRegion>,
    pub settings: Settings,
}

impl ResolveRequest {
    pub fn new(regions: Vec<AdRegion>, settings: Settings) -> Self {
        Self { regions, settings }
    }

    /// Parses a JSON region list. Anything other than an array of regions is rejected whole.
    pub fn from_value(value: &Value, settings: Settings) -> Result<Self, InputError> {
        let items = value
            .as_array()
            .ok_or_else(|| InputError::Malformed("expected an array of regions".to_string()))?;

        let regions = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::from_value::<AdRegion>(item.clone())
                    .map_err(|e| InputError::Malformed(format!("region {index}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(regions, settings))
    }

    pub fn validate(&self) -> Result<(), InputError> {
        for (index, region) in self.regions.iter().enumerate() {
            if !region.page_rect().is_finite() || !region.confidence.is_finite() {
                return Err(InputError::NonFiniteRegion { index });
            }
            if region.width <= 0.0 || region.height <= 0.0 {
                return Err(InputError::EmptyRegion {
                    index,
                    width: region.width,
                    height: region.height,
                });
            }
            if !(0.0..=1.0).contains(&region.confidence) {
                return Err(InputError::ConfidenceOutOfRange {
                    index,
                    confidence: region.confidence,
                });
            }
        }
        Ok(())
    }
}

/// Validates the whole request before touching the tree, then resolves every region.
pub fn resolve_request<T: RenderedTree + ?Sized>(
    tree: &mut T,
    request: &ResolveRequest,
    config: ResolverConfig,
) -> Result<ResolutionReport, InputError> {
    request.validate()?;
    let resolver = Resolver::new(config, request.settings);
    Ok(resolver.resolve(tree, &request.regions))
}

/// Full page analysis: classify fragments, fuse with detections, lift to
/// page regions using the tree's scroll, then resolve.
pub async fn analyze_page<C, T>(
    classifier: &C,
    tree: &mut T,
    detections: &[Detection],
    fragments: &[String],
    settings: Settings,
    config: ResolverConfig,
) -> Result<PageReport, InputError>
where
    C: TextClassifier + ?Sized,
    T: RenderedTree + ?Sized,
{
    let texts = classify_all(classifier, fragments).await;
    let decisions = TableFusionEngine::new().fuse(detections, &texts);

    let viewport = tree.viewport();
    let regions = regions::lift(&decisions, viewport.scroll);
    info!(
        decisions = decisions.len(),
        regions = regions.len(),
        "fused classifier results"
    );

    let request = ResolveRequest::new(regions, settings);
    let resolution = resolve_request(tree, &request, config)?;

    Ok(PageReport {
        url: tree.page_url().map(str::to_string),
        viewport,
        decisions,
        regions: request.regions,
        resolution,
    })
}

pub fn export_report(report: &PageReport, output: &Path) -> Result<()> {
    JsonExporter::new(output.to_path_buf())
        .export(report)
        .with_context(|| format!("failed to write report to {}", output.display()))?;

    HtmlDebugExporter::new(output.join("debug"))
        .export(report)
        .with_context(|| format!("failed to write debug view to {}", output.display()))?;

    Ok(())
}
