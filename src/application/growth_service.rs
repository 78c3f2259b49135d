// Growth service - Use case for growth graphs, monthly tables and plant analyses
use crate::application::advisor::PlantAdvisor;
use crate::application::plant_repository::PlantRepository;
use crate::application::worker_pool::WorkerPool;
use crate::domain::growth::{
    monthly_rows, GrowthGraph, GrowthProjection, MonthlyDataRow, PeriodAnalysis, PeriodUnit,
};
use crate::domain::narrative::{self, PeriodFacts, SeriesSummary};
use crate::domain::plant::PlantIdentification;
use serde::Serialize;
use std::sync::Arc;

const SPLIT_LAYOUT: &str = "split";

/// Template-only narration of one period
pub fn narrate_period(facts: &PeriodFacts) -> PeriodAnalysis {
    PeriodAnalysis {
        period: facts.period,
        good_condition_analysis: narrative::good_condition_analysis(facts),
        bad_condition_description: narrative::bad_condition_description(facts),
        bad_condition_impact: narrative::bad_condition_impact(facts),
        llm_comprehensive_analysis: narrative::period_summary_fallback(facts),
        layout_type: SPLIT_LAYOUT.to_string(),
    }
}

/// Projection plus template narratives, computed on a worker
fn assemble_graph(
    plant_name: &str,
    unit: PeriodUnit,
    max_periods: u32,
    confidence: Option<f64>,
) -> GrowthGraph {
    let projection = GrowthProjection::compute(plant_name, unit, max_periods, confidence);
    let analyses = projection
        .good_growth
        .iter()
        .zip(&projection.bad_growth)
        .map(|(good, bad)| {
            narrate_period(&PeriodFacts {
                plant_name,
                period: good.period,
                unit,
                good_size: good.size,
                bad_size: bad.size,
            })
        })
        .collect();
    GrowthGraph::assemble(plant_name, unit, projection, analyses)
}

#[derive(Debug, Clone, Serialize)]
pub struct GrowthInsight {
    pub growth_graph: GrowthGraph,
    pub analysis_text: String,
    pub monthly_data: Vec<MonthlyDataRow>,
    pub comprehensive_analysis: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyAnalysis {
    pub identification: PlantIdentification,
    pub growth_graph: GrowthGraph,
    pub monthly_data: Vec<MonthlyDataRow>,
    pub comprehensive_analysis: String,
}

#[derive(Clone)]
pub struct GrowthService {
    pool: WorkerPool,
    advisor: PlantAdvisor,
    repository: Arc<dyn PlantRepository>,
    per_period_llm: bool,
}

impl GrowthService {
    pub fn new(
        pool: WorkerPool,
        advisor: PlantAdvisor,
        repository: Arc<dyn PlantRepository>,
        per_period_llm: bool,
    ) -> Self {
        Self {
            pool,
            advisor,
            repository,
            per_period_llm,
        }
    }

    /// Narrate one period; the comprehensive text comes from the model when
    /// per-period analysis is on and the call succeeds
    pub async fn narrate(
        &self,
        facts: &PeriodFacts<'_>,
        identification: Option<&PlantIdentification>,
    ) -> PeriodAnalysis {
        let mut analysis = narrate_period(facts);
        if self.per_period_llm {
            analysis.llm_comprehensive_analysis =
                self.advisor.period_summary(facts, identification).await;
        }
        analysis
    }

    pub async fn build_graph(
        &self,
        plant_name: &str,
        unit: PeriodUnit,
        max_periods: u32,
        identification: Option<&PlantIdentification>,
    ) -> anyhow::Result<GrowthGraph> {
        let name = plant_name.to_string();
        let confidence = identification.map(|id| id.confidence);
        let mut graph = self
            .pool
            .run(move || assemble_graph(&name, unit, max_periods, confidence))
            .await?;

        if self.per_period_llm {
            let narrations = graph
                .good_growth
                .iter()
                .zip(&graph.bad_growth)
                .map(|(good, bad)| {
                    let facts = PeriodFacts {
                        plant_name,
                        period: good.period,
                        unit,
                        good_size: good.size,
                        bad_size: bad.size,
                    };
                    async move { self.narrate(&facts, identification).await }
                });
            graph.period_analyses = futures::future::join_all(narrations).await;
        }

        tracing::debug!(
            plant = plant_name,
            unit = %unit,
            max_periods,
            points = graph.good_growth.len(),
            "Growth graph built"
        );
        Ok(graph)
    }

    /// Comprehensive analysis of a whole graph
    pub async fn plant_analysis(&self, graph: &GrowthGraph, periods: u32) -> String {
        let good = graph.good_series();
        let bad = graph.bad_series();
        let summary = SeriesSummary {
            plant_name: &graph.plant_name,
            ceiling: graph.max_size,
            start_size: good.first().copied().unwrap_or(graph.min_size),
            unit: graph.period_unit,
            periods,
            good_series: &good,
            bad_series: &bad,
        };
        self.advisor.plant_analysis(&summary).await
    }

    /// Persist the identification, then build the graph and its analyses
    pub async fn growth_insight(
        &self,
        identification: &PlantIdentification,
        file_hash: Option<String>,
        unit: PeriodUnit,
        max_periods: u32,
    ) -> anyhow::Result<GrowthInsight> {
        let data_id = self
            .repository
            .save_identification(identification, file_hash)
            .await?;
        tracing::info!(data_id = %data_id, plant = %identification.plant_name, "Identification saved");

        let plant_name = &identification.plant_name;
        let graph = self
            .build_graph(plant_name, unit, max_periods, Some(identification))
            .await?;
        let start_size = graph
            .good_growth
            .first()
            .map(|p| p.size)
            .unwrap_or(graph.min_size);
        let analysis_text =
            narrative::growth_outlook(plant_name, unit, max_periods, start_size, graph.max_size);
        let monthly_data = monthly_rows(&graph);
        let comprehensive_analysis = self.plant_analysis(&graph, max_periods).await;

        Ok(GrowthInsight {
            growth_graph: graph,
            analysis_text,
            monthly_data,
            comprehensive_analysis,
        })
    }

    /// Monthly table for a stored identification, or for the bare name when
    /// nothing was stored
    pub async fn monthly_analysis(
        &self,
        plant_name: &str,
        max_months: u32,
        data_id: Option<&str>,
    ) -> anyhow::Result<MonthlyAnalysis> {
        let identification = match self
            .repository
            .load_identification(data_id, Some(plant_name))
            .await?
        {
            Some(record) => record.identification,
            None => {
                tracing::debug!(plant = plant_name, "No stored identification, assuming plant name");
                PlantIdentification::assumed(plant_name)
            }
        };

        let graph = self
            .build_graph(
                &identification.plant_name,
                PeriodUnit::Month,
                max_months,
                Some(&identification),
            )
            .await?;
        let monthly_data = monthly_rows(&graph);
        let comprehensive_analysis = self.plant_analysis(&graph, max_months).await;

        Ok(MonthlyAnalysis {
            identification,
            growth_graph: graph,
            monthly_data,
            comprehensive_analysis,
        })
    }
}
