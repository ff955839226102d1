use std::collections::BTreeMap;

use crate::config::RecommendationThresholds;
use crate::models::{DetectedEvent, EventCategory, Priority, Recommendation, RecommendationKind};

pub fn count_by_category(events: &[DetectedEvent]) -> BTreeMap<EventCategory, usize> {
    let mut counts = BTreeMap::new();
    for event in events {
        *counts.entry(event.category).or_insert(0) += 1;
    }
    counts
}

/// Map event counts to recommendations, highest priority first. Deterministic
/// for a given event list.
pub fn generate(
    events: &[DetectedEvent],
    thresholds: &RecommendationThresholds,
) -> Vec<Recommendation> {
    let counts = count_by_category(events);
    let count = |category: EventCategory| counts.get(&category).copied().unwrap_or(0);
    let mut recommendations = Vec::new();

    if count(EventCategory::Energy) > thresholds.energy_events {
        recommendations.push(recommendation(
            RecommendationKind::EnergyOptimization,
            Priority::High,
            "Optimiser la consommation énergétique",
            "Planifier un audit énergétique et décaler les cycles les plus gourmands hors des heures de pointe.",
            "Réduction de 10 à 15% de la facture énergétique",
        ));
    }

    if count(EventCategory::Budget) > thresholds.budget_events {
        recommendations.push(recommendation(
            RecommendationKind::BudgetControl,
            Priority::High,
            "Renforcer le contrôle budgétaire",
            "Revoir les formulations les plus coûteuses et renégocier les matières premières critiques.",
            "Retour sous le budget mensuel",
        ));
    }

    if count(EventCategory::MixingTime) > thresholds.mixing_events {
        recommendations.push(recommendation(
            RecommendationKind::ProcessOptimization,
            Priority::Medium,
            "Optimiser les temps de mélange",
            "Standardiser les séquences de chargement et vérifier l'état des mélangeurs.",
            "Gain de capacité de production",
        ));
    }

    if count(EventCategory::Stock) > thresholds.stock_events {
        recommendations.push(recommendation(
            RecommendationKind::StockManagement,
            Priority::Medium,
            "Améliorer la gestion des stocks",
            "Mettre en place des inventaires tournants et revoir les seuils de réapprovisionnement.",
            "Moins de ruptures et d'écarts d'inventaire",
        ));
    }

    if count(EventCategory::Logistics) > thresholds.logistics_events {
        recommendations.push(recommendation(
            RecommendationKind::LogisticsImprovement,
            Priority::Medium,
            "Accélérer la préparation des commandes",
            "Réorganiser les zones de picking selon la rotation des articles.",
            "Meilleur taux d'expédition",
        ));
    }

    if events.is_empty() {
        recommendations.push(recommendation(
            RecommendationKind::MaintainPerformance,
            Priority::Low,
            "Maintenir les performances",
            "Aucune alerte ce mois-ci, conserver les pratiques actuelles.",
            "Stabilité des indicateurs",
        ));
    }

    recommendations
}

fn recommendation(
    kind: RecommendationKind,
    priority: Priority,
    title: &str,
    description: &str,
    impact: &str,
) -> Recommendation {
    Recommendation {
        kind,
        priority,
        title: title.to_string(),
        description: description.to_string(),
        impact: impact.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventKind, KpiId, Severity};

    fn event(kpi: KpiId, week: u32) -> DetectedEvent {
        DetectedEvent {
            kind: EventKind::LowPerformance,
            severity: Severity::Warning,
            category: kpi.category(),
            kpi,
            title: "alert".to_string(),
            description: String::new(),
            iso_year: 2024,
            week,
        }
    }

    #[test]
    fn three_energy_events_trigger_one_high_priority_recommendation() {
        let events = vec![
            event(KpiId::EnergyConsumption, 10),
            event(KpiId::EnergyConsumption, 11),
            event(KpiId::EnergyConsumption, 12),
        ];
        let recommendations = generate(&events, &RecommendationThresholds::default());
        let energy: Vec<&Recommendation> = recommendations
            .iter()
            .filter(|r| r.kind == RecommendationKind::EnergyOptimization)
            .collect();
        assert_eq!(energy.len(), 1);
        assert_eq!(energy[0].priority, Priority::High);
    }

    #[test]
    fn two_energy_events_are_below_cutoff() {
        let events = vec![
            event(KpiId::EnergyConsumption, 10),
            event(KpiId::EnergyConsumption, 11),
        ];
        let recommendations = generate(&events, &RecommendationThresholds::default());
        assert!(recommendations.is_empty());
    }

    #[test]
    fn single_budget_event_is_enough() {
        let recommendations = generate(
            &[event(KpiId::FormulationCost, 13)],
            &RecommendationThresholds::default(),
        );
        assert_eq!(recommendations.len(), 1);
        assert_eq!(recommendations[0].kind, RecommendationKind::BudgetControl);
    }

    #[test]
    fn quiet_month_gets_maintain_recommendation() {
        let recommendations = generate(&[], &RecommendationThresholds::default());
        assert_eq!(recommendations.len(), 1);
        assert_eq!(recommendations[0].kind, RecommendationKind::MaintainPerformance);
        assert_eq!(recommendations[0].priority, Priority::Low);
    }

    #[test]
    fn output_is_stable_for_same_input() {
        let events = vec![
            event(KpiId::StockIssues, 10),
            event(KpiId::MixingTime, 10),
            event(KpiId::StockIssues, 11),
            event(KpiId::MixingTime, 12),
            event(KpiId::FormulationCost, 12),
        ];
        let thresholds = RecommendationThresholds::default();
        let first = generate(&events, &thresholds);
        assert_eq!(first, generate(&events, &thresholds));
        let kinds: Vec<RecommendationKind> = first.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RecommendationKind::BudgetControl,
                RecommendationKind::ProcessOptimization,
                RecommendationKind::StockManagement,
            ]
        );
    }

    #[test]
    fn counts_group_by_category() {
        let counts = count_by_category(&[
            event(KpiId::MixingTime, 10),
            event(KpiId::MixingTime, 11),
            event(KpiId::OrderFulfillment, 11),
        ]);
        assert_eq!(counts[&EventCategory::MixingTime], 2);
        assert_eq!(counts[&EventCategory::Logistics], 1);
    }
}
