//! Integration tests for the Cortex facade.
//!
//! Runs against an in-memory knowledge graph and an on-disk SQLite store in
//! a temp directory, the same wiring the binary uses.

use std::sync::Arc;
use synapse_core::{EnneagramType, SynapseConfig};
use synapse_memory::MemoryGraph;
use synapse_reasoning::{Cortex, Desire};

const GRAPH: &str = r#"{
    "nodes": [
        {"id": "p1", "name": "Remédio da pressão", "label": "Medication", "content": "Losartana 50mg às 08:00"},
        {"id": "c1", "name": "Hipertensão", "label": "Condition"},
        {"id": "d1", "name": "Dr. Silva", "label": "Person"},
        {"id": "e1", "name": "Medo de cair", "label": "Memory"},
        {"id": "r1", "name": "Corredor escuro", "label": "Place"}
    ],
    "edges": [
        {"from": "p1", "to": "c1", "type": "TREATS"},
        {"from": "c1", "to": "d1", "type": "FOLLOWED_BY"},
        {"from": "e1", "to": "r1", "type": "HAPPENED_AT"}
    ]
}"#;

async fn setup_cortex(dir: &tempfile::TempDir, base_type: EnneagramType) -> Cortex {
    let mut config = SynapseConfig::default();
    config.storage.db_path = dir.path().join("synapse.db").to_string_lossy().into_owned();
    config.persona.base_type = base_type;
    let graph = Arc::new(MemoryGraph::from_json(GRAPH).unwrap());
    Cortex::from_config(&config, graph).await.unwrap()
}

#[tokio::test]
async fn test_prime_then_context() {
    let dir = tempfile::TempDir::new().unwrap();
    let cortex = setup_cortex(&dir, EnneagramType::Peacemaker).await;

    let report = cortex.prime("idoso-7", "o remédio").await.unwrap();
    assert_eq!(report.activated, 1);

    let context = cortex.get_context("idoso-7", &["remédio".to_string()]).await;
    let act = &context["remédio"];
    assert_eq!(act.root, "Remédio da pressão");
    assert_eq!(act.nodes[0].name, "Hipertensão");
}

#[tokio::test]
async fn test_refusal_guidance_includes_context_and_strategy() {
    let dir = tempfile::TempDir::new().unwrap();
    let cortex = setup_cortex(&dir, EnneagramType::Peacemaker).await;
    let text = "Não quero tomar o remédio";

    cortex.prime("idoso-7", text).await.unwrap();
    let outcome = cortex.infer("idoso-7", text).await.unwrap();
    assert_eq!(outcome.inference.desire, Desire::Security);
    assert!(outcome.interpellate);

    let guidance = cortex.compose_guidance("idoso-7", text, &outcome).await.unwrap();
    assert!(guidance.starts_with("You are in PEACEMAKER mode"));
    assert!(guidance.contains("== CONTEXT: Remédio da pressão =="));
    assert!(guidance.contains("[LATENT DESIRE DETECTED]"));
    assert!(guidance.contains("FOCUS: Convey safety"));
}

#[tokio::test]
async fn test_fear_shifts_stance() {
    let dir = tempfile::TempDir::new().unwrap();
    let cortex = setup_cortex(&dir, EnneagramType::Peacemaker).await;
    let text = "tenho medo de cair no corredor";

    let outcome = cortex.infer("idoso-7", text).await.unwrap();
    assert_eq!(outcome.router.active_type, EnneagramType::Loyalist);

    let guidance = cortex.compose_guidance("idoso-7", text, &outcome).await.unwrap();
    assert!(guidance.starts_with("You are in LOYALIST mode"));
    assert!(guidance.contains("AMPLIFY focus on 'RISCO'"));

    let weights = cortex.attention_weights(outcome.router.active_type);
    assert_eq!(weights["RISCO"], 2.2);
}

#[tokio::test]
async fn test_recurring_signifier_question_asked_once() {
    let dir = tempfile::TempDir::new().unwrap();
    let cortex = setup_cortex(&dir, EnneagramType::Peacemaker).await;

    for _ in 0..5 {
        cortex.infer("idoso-7", "a solidão").await.unwrap();
    }
    let outcome = cortex.infer("idoso-7", "de novo a solidão").await.unwrap();
    assert_eq!(outcome.history[0].word, "solidão");
    assert_eq!(outcome.history[0].frequency, 5);

    let guidance = cortex
        .compose_guidance("idoso-7", "de novo a solidão", &outcome)
        .await
        .unwrap();
    assert!(guidance.contains("[RECURRING SIGNIFIER]"));
    assert!(guidance.contains("'solidão'"));

    // marked as interpellated: not asked again inside the cooldown
    let outcome = cortex.infer("idoso-7", "solidão").await.unwrap();
    let guidance = cortex.compose_guidance("idoso-7", "solidão", &outcome).await.unwrap();
    assert!(!guidance.contains("[RECURRING SIGNIFIER]"));
}

#[tokio::test]
async fn test_inference_serializes_for_downstream() {
    let dir = tempfile::TempDir::new().unwrap();
    let cortex = setup_cortex(&dir, EnneagramType::Peacemaker).await;
    let outcome = cortex.infer("idoso-7", "Não quero tomar o remédio").await.unwrap();

    let json = serde_json::to_value(&outcome.inference).unwrap();
    assert_eq!(json["desire"], "security");
    assert!(json["alternatives"]["autonomy"].as_f64().unwrap() > 0.0);
}
