//! End-to-end scenarios driving the processor through the full pipeline:
//! classification, relationship resolution, evaluation, aggregation,
//! cascade, and output assembly.

use formular::{Attribute, Entity, FormulaProcessor, ModelError, ResultValue};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use std::str::FromStr;

fn dec(text: &str) -> Decimal {
    Decimal::from_str(text).unwrap()
}

fn number(text: &str) -> Option<ResultValue> {
    Some(ResultValue::Number(dec(text)))
}

/// Contract → Servico → Medicao chain used by the tax scenarios
fn contract_chain() -> Vec<Entity> {
    vec![
        Entity::new("C1", "Contract").with_attribute(Attribute::number("ISS", "0.05")),
        Entity::new("S1", "Servico").with_attribute(Attribute::text("contractId", "C1")),
        Entity::new("M1", "Medicao")
            .with_attribute(Attribute::text("serviceId", "S1"))
            .with_attribute(Attribute::number("qtd", "10"))
            .with_attribute(Attribute::number("valor", "2.5")),
    ]
}

#[test]
fn direct_product_scenario() {
    let entities = vec![Entity::new("P1", "Produto")
        .with_attribute(Attribute::number("preco", "10.5"))
        .with_attribute(Attribute::number("qtd", "3"))];
    let processor = FormulaProcessor::new(entities).unwrap();
    let output = processor.process(&["Produto.preco * Produto.qtd".to_string()]);

    assert_eq!(output.direct_results.len(), 1);
    let result = &output.direct_results[0];
    assert_eq!(result.entity_id, "P1");
    assert_eq!(result.formula, "Produto.preco * Produto.qtd");
    assert_eq!(result.resolved_formula, "10.5 * 3");
    assert_eq!(result.result, number("31.5"));
    assert_eq!(result.result_type.as_deref(), Some("float"));
    assert_eq!(result.error, None);
    assert!(result.success);
}

#[test]
fn fully_resolved_formulas_contain_no_tokens() {
    let entities = vec![Entity::new("P1", "Produto")
        .with_attribute(Attribute::number("preco", "2"))
        .with_attribute(Attribute::text("nome", "Widget"))];
    let processor = FormulaProcessor::new(entities).unwrap();
    let output = processor.process(&[
        "Produto.preco + 1".to_string(),
        "len(Produto.nome) * Produto.preco".to_string(),
    ]);

    for result in &output.direct_results {
        assert!(result.success);
        assert!(
            !result.resolved_formula.contains("Produto."),
            "resolved text still carries a token: {}",
            result.resolved_formula
        );
    }
}

#[test]
fn missing_attribute_yields_failure_with_error() {
    let entities = vec![Entity::new("P1", "Produto")];
    let processor = FormulaProcessor::new(entities).unwrap();
    let output = processor.process(&["Produto.preco * 2".to_string()]);

    assert_eq!(output.direct_results.len(), 1);
    let result = &output.direct_results[0];
    assert!(!result.success);
    assert_eq!(result.result, None);
    assert_eq!(result.result_type, None);
    let error = result.error.as_deref().unwrap();
    assert!(!error.is_empty());
    assert!(error.contains("preco"));
}

#[test]
fn sum_aggregation_lands_on_the_service() {
    let processor = FormulaProcessor::new(contract_chain()).unwrap();
    let output =
        processor.process(&["SUM(Servico.Medicao.qtd * Servico.Medicao.valor)".to_string()]);

    let result = &output.direct_results[0];
    assert_eq!(result.entity_id, "S1");
    assert_eq!(result.resolved_formula, "SUM(qtd * valor)");
    assert_eq!(result.result, number("25.0"));
    assert!(result.success);

    assert_eq!(output.aggregated_entities.len(), 1);
    let view = &output.aggregated_entities[0];
    assert_eq!(view.id, "S1");
    assert_eq!(view.computed.len(), 1);
    assert_eq!(view.computed[0].key, "SUM(qtd * valor)");
    assert_eq!(view.computed[0].value, ResultValue::Number(dec("25.0")));
}

#[test]
fn cascade_computes_the_dependent_total() {
    let processor = FormulaProcessor::new(contract_chain()).unwrap();
    let output = processor.process(&[
        "SUM(Servico.Medicao.qtd * Servico.Medicao.valor)".to_string(),
        "Contract.ISS * TotalDosServicos".to_string(),
    ]);

    let tributo = output
        .direct_results
        .iter()
        .find(|r| r.resolved_formula == "ISS (0.05) * TotalDosServicos (25.0)")
        .expect("cascade result");
    assert_eq!(tributo.entity_id, "C1");
    assert_eq!(tributo.result, number("1.25"));
    assert!(tributo.success);

    let contract = output
        .aggregated_entities
        .iter()
        .find(|v| v.id == "C1")
        .expect("contract view");
    assert_eq!(contract.computed.len(), 1);
    assert_eq!(contract.computed[0].key, "Tributo");
    assert_eq!(contract.computed[0].value, ResultValue::Number(dec("1.25")));
    assert_eq!(
        contract.computed[0].description,
        "ISS (0.05) * TotalDosServicos (25.0)"
    );
}

#[test]
fn cascade_without_leaves_is_zero() {
    let entities = vec![Entity::new("C1", "Contract")
        .with_attribute(Attribute::number("ISS", "0.05"))];
    let processor = FormulaProcessor::new(entities).unwrap();
    let output = processor.process(&["Contract.ISS * TotalDosServicos".to_string()]);

    let tributo = output
        .direct_results
        .iter()
        .find(|r| r.success)
        .expect("cascade result");
    assert_eq!(tributo.result, number("0"));
}

#[test]
fn count_aggregation_counts_contributing_leaves() {
    let mut entities = contract_chain();
    entities.push(
        Entity::new("M2", "Medicao")
            .with_attribute(Attribute::text("serviceId", "S1"))
            .with_attribute(Attribute::number("qtd", "1"))
            .with_attribute(Attribute::number("valor", "4")),
    );
    let processor = FormulaProcessor::new(entities).unwrap();
    let output =
        processor.process(&["COUNT(Servico.Medicao.qtd * Servico.Medicao.valor)".to_string()]);

    let result = &output.direct_results[0];
    assert_eq!(result.entity_id, "S1");
    assert_eq!(result.result, number("2"));
    assert_eq!(result.result_type.as_deref(), Some("float"));
}

#[test]
fn reference_aggregation_over_empty_set_succeeds_with_zero() {
    let entities = vec![Entity::new("C1", "Contract")];
    let processor = FormulaProcessor::new(entities).unwrap();
    let output =
        processor.process(&["SUM(Contract.Servico.valor * @medicaoRef.qtd)".to_string()]);

    assert_eq!(output.direct_results.len(), 1);
    let result = &output.direct_results[0];
    assert_eq!(result.entity_id, "C1");
    assert_eq!(result.result, number("0.0"));
    assert_eq!(result.result_type.as_deref(), Some("float"));
    assert!(result.success);
    assert_eq!(
        result.resolved_formula,
        "SUM(Servico.valor * @medicaoRef.qtd)"
    );
}

#[test]
fn reference_aggregation_multiplies_through_the_reference() {
    let entities = vec![
        Entity::new("C1", "Contract"),
        Entity::new("S1", "Servico")
            .with_attribute(Attribute::text("contractId", "C1"))
            .with_attribute(Attribute::number("valor", "3"))
            .with_attribute(Attribute::text("medicaoRef", "M1")),
        Entity::new("M1", "Medicao").with_attribute(Attribute::number("qtd", "7")),
    ];
    let processor = FormulaProcessor::new(entities).unwrap();
    let output =
        processor.process(&["SUM(Contract.Servico.valor * @medicaoRef.qtd)".to_string()]);

    let result = &output.direct_results[0];
    assert_eq!(result.entity_id, "C1");
    assert_eq!(result.result, number("21"));

    // The aggregate also lands on the contract's view
    let view = output
        .aggregated_entities
        .iter()
        .find(|v| v.id == "C1")
        .expect("contract view");
    assert_eq!(view.computed[0].key, "SUM(Servico.valor * @medicaoRef.qtd)");
}

#[test]
fn summary_has_no_duplicate_triples() {
    let formula = "Produto.preco * Produto.qtd".to_string();
    let entities = vec![Entity::new("P1", "Produto")
        .with_attribute(Attribute::number("preco", "10.5"))
        .with_attribute(Attribute::number("qtd", "3"))];
    let processor = FormulaProcessor::new(entities).unwrap();
    let output = processor.process(&[formula.clone(), formula.clone(), formula]);

    let mut keys: Vec<(String, String, String)> = output
        .direct_results
        .iter()
        .map(|r| {
            (
                r.entity_id.clone(),
                r.formula.clone(),
                r.resolved_formula.clone(),
            )
        })
        .collect();
    let before = keys.len();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), before);
}

#[test]
fn duplicate_entity_ids_are_a_fatal_construction_error() {
    let err = FormulaProcessor::new(vec![
        Entity::new("E1", "Tipo"),
        Entity::new("E1", "Outro"),
    ])
    .unwrap_err();
    assert_eq!(err, ModelError::duplicate_id("E1"));
}

#[test]
fn wire_shapes_round_trip_through_serde() {
    let entities: Vec<Entity> = serde_json::from_value(serde_json::json!([
        {
            "id": "P1",
            "entity_type": ["Produto"],
            "attributes": [
                {"key": "preco", "value": "10.5", "type": "number"},
                {"key": "qtd", "value": "3", "type": "number"}
            ]
        }
    ]))
    .unwrap();
    let processor = FormulaProcessor::new(entities).unwrap();
    let output = processor.process(&["Produto.preco * Produto.qtd".to_string()]);

    let json = serde_json::to_value(&output).unwrap();
    assert_eq!(json["direct_results"][0]["result"], serde_json::json!(31.5));
    assert_eq!(json["direct_results"][0]["result_type"], "float");
    assert_eq!(json["direct_results"][0].get("error"), None);
    assert_eq!(json["aggregated_entities"], serde_json::json!([]));
}

#[test]
fn multiple_contracts_keep_their_cascades_separate() {
    let entities = vec![
        Entity::new("C1", "Contract").with_attribute(Attribute::number("ISS", "0.05")),
        Entity::new("C2", "Contract").with_attribute(Attribute::number("ISS", "0.10")),
        Entity::new("S1", "Servico").with_attribute(Attribute::text("contractId", "C1")),
        Entity::new("S2", "Servico").with_attribute(Attribute::text("contractId", "C2")),
        Entity::new("M1", "Medicao")
            .with_attribute(Attribute::text("serviceId", "S1"))
            .with_attribute(Attribute::number("qtd", "10"))
            .with_attribute(Attribute::number("valor", "2.5")),
        Entity::new("M2", "Medicao")
            .with_attribute(Attribute::text("serviceId", "S2"))
            .with_attribute(Attribute::number("qtd", "4"))
            .with_attribute(Attribute::number("valor", "10")),
    ];
    let processor = FormulaProcessor::new(entities).unwrap();
    let output = processor.process(&[
        "SUM(Servico.Medicao.qtd * Servico.Medicao.valor)".to_string(),
        "Contract.ISS * TotalDosServicos".to_string(),
    ]);

    let tributo_of = |id: &str| {
        output
            .aggregated_entities
            .iter()
            .find(|v| v.id == id)
            .and_then(|v| v.computed.iter().find(|c| c.key == "Tributo"))
            .map(|c| c.value.clone())
    };
    // C1: 0.05 * 25.0, C2: 0.10 * 40
    assert_eq!(tributo_of("C1"), Some(ResultValue::Number(dec("1.25"))));
    assert_eq!(tributo_of("C2"), Some(ResultValue::Number(dec("4"))));
}
