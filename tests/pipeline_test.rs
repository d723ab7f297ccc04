mod helpers;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use helpers::{
    dairy_records, low_stock_tool, pipeline_with, pipeline_with_config, products_tool,
    sales_tool, tool, FakeModel, FakeSearch, FakeTransport,
};
use serde_json::json;
use stocktalk::config::StocktalkConfig;
use stocktalk::format::viz::ChartType;
use stocktalk::types::FormattedResponse;

#[tokio::test]
async fn dairy_scenario_end_to_end() {
    let search = Arc::new(FakeSearch::new(vec![
        low_stock_tool(),
        products_tool(),
        sales_tool(),
    ]));
    let model = Arc::new(FakeModel::native(
        "search",
        json!({"query": "dairy products low stock"}),
    ));
    let transport = Arc::new(FakeTransport::ok(json!({
        "success": true,
        "data": dairy_records(),
        "count": 3
    })));

    let pipeline = pipeline_with(search, model, transport.clone());
    let reply = pipeline
        .answer(
            "Show me all dairy products from Fresh Dairy Co. under 30 units in stock",
            &[],
            "session-1",
        )
        .await;

    // Category support beats the low-stock tool that appears first.
    assert_eq!(reply.tool_name.as_deref(), Some("GetProducts"));

    let params = transport.call_params(0);
    assert_eq!(params.get("category"), Some(&json!("Dairy")));
    assert_eq!(params.get("supplier"), Some(&json!("Fresh Dairy Co.")));
    assert_eq!(params.get("threshold"), Some(&json!(30)));
    assert!(
        !params.contains_key("startDate"),
        "inventory tools get no injected date range"
    );
    assert!(
        !params.contains_key("query"),
        "transport keys never reach the tool"
    );

    match &reply.response {
        FormattedResponse::Table {
            table_data: Some(rows),
            summary,
            ..
        } => {
            assert_eq!(rows.len(), 3);
            assert!(summary.contains("3 record(s)"));
        }
        other => panic!("expected detail table, got {other:?}"),
    }

    assert!(
        !reply.chart.show_chart,
        "a plain listing never grows a chart"
    );
}

#[tokio::test]
async fn revenue_summary_collapses_to_aggregate() {
    let search = Arc::new(FakeSearch::new(vec![sales_tool()]));
    let model = Arc::new(FakeModel::text_reply("Looking at your sales now."));
    let transport = Arc::new(FakeTransport::ok(json!({
        "success": true,
        "data": [
            {"date": "2024-03-10", "total": 120.0, "product": "Milk"},
            {"date": "2024-03-12", "total": 80.0, "product": "Butter"}
        ]
    })));

    let pipeline = pipeline_with(search, model, transport.clone());
    let reply = pipeline
        .answer("what was our total revenue last week", &[], "session-2")
        .await;

    assert_eq!(reply.tool_name.as_deref(), Some("GetSalesData"));

    // "last week" became an explicit window, so no silent default applies.
    let params = transport.call_params(0);
    assert!(params.contains_key("startDate"));
    assert!(params.contains_key("endDate"));

    match &reply.response {
        FormattedResponse::Table {
            table_data,
            summary,
            ..
        } => {
            assert!(table_data.is_none(), "summary mode carries no rows");
            assert!(summary.contains("$200.00"));
        }
        other => panic!("expected aggregate summary, got {other:?}"),
    }
}

#[tokio::test]
async fn sales_tool_gets_default_date_range() {
    let search = Arc::new(FakeSearch::new(vec![sales_tool()]));
    let model = Arc::new(FakeModel::text_reply("Fetching sales."));
    let transport = Arc::new(FakeTransport::ok(json!({
        "success": true,
        "data": [{"date": "2024-03-01", "total": 10.0}]
    })));

    let pipeline = pipeline_with(search, model, transport.clone());
    let reply = pipeline
        .answer("show me each sales transaction", &[], "session-3")
        .await;

    let params = transport.call_params(0);
    assert!(
        params.contains_key("startDate") && params.contains_key("endDate"),
        "sales tools imply a trailing window"
    );

    match &reply.response {
        FormattedResponse::Table { summary, .. } => {
            assert!(
                summary.contains("defaulted"),
                "silent defaults are disclosed: {summary}"
            );
        }
        other => panic!("expected table, got {other:?}"),
    }
}

#[tokio::test]
async fn schema_question_skips_model_and_tools() {
    let search = Arc::new(FakeSearch::new(vec![products_tool()]));
    let model = Arc::new(FakeModel::text_reply("should never be called"));
    let transport = Arc::new(FakeTransport::ok(json!({})));

    let pipeline = pipeline_with(search.clone(), model.clone(), transport.clone());
    let reply = pipeline
        .answer("what tools do you have", &[], "session-4")
        .await;

    assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    assert_eq!(transport.call_count(), 0);

    match &reply.response {
        FormattedResponse::Text { text } => {
            assert!(text.contains("GetProducts"));
        }
        other => panic!("expected capability text, got {other:?}"),
    }
}

#[tokio::test]
async fn repeated_question_hits_the_cache() {
    let search = Arc::new(FakeSearch::new(vec![products_tool()]));
    let model = Arc::new(FakeModel::native("search", json!({"query": "inventory"})));
    let transport = Arc::new(FakeTransport::ok(json!({
        "success": true,
        "data": dairy_records()
    })));

    let pipeline = pipeline_with(search.clone(), model, transport.clone());
    let question = "show me all dairy products in stock";

    let first = pipeline.answer(question, &[], "session-5").await;
    let second = pipeline.answer(question, &[], "session-5").await;

    assert_eq!(transport.call_count(), 1, "second answer is served cached");
    assert_eq!(first.response, second.response);
    assert!(pipeline.cache_stats().hits >= 1);
}

#[tokio::test]
async fn http_error_degrades_to_text() {
    let search = Arc::new(FakeSearch::new(vec![products_tool()]));
    let model = Arc::new(FakeModel::native("search", json!({"query": "inventory"})));
    let transport = Arc::new(FakeTransport::with_status(500, json!({"oops": true})));

    let pipeline = pipeline_with(search, model, transport.clone());
    let reply = pipeline
        .answer("show me all products in inventory", &[], "session-6")
        .await;

    match &reply.response {
        FormattedResponse::Text { text } => {
            assert!(text.contains("HTTP 500"), "got: {text}");
        }
        other => panic!("expected error text, got {other:?}"),
    }

    // Failures are never cached; a retry calls the transport again.
    pipeline
        .answer("show me all products in inventory", &[], "session-6")
        .await;
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test]
async fn no_candidates_falls_back_to_model_reply() {
    let search = Arc::new(FakeSearch::new(Vec::new()));
    let model = Arc::new(FakeModel::text_reply(
        "I can answer questions about inventory, sales, and suppliers.",
    ));
    let transport = Arc::new(FakeTransport::ok(json!({})));

    let pipeline = pipeline_with(search, model, transport.clone());
    let reply = pipeline.answer("tell me a joke", &[], "session-7").await;

    assert!(reply.tool_name.is_none());
    assert_eq!(transport.call_count(), 0);
    match &reply.response {
        FormattedResponse::Text { text } => {
            assert!(text.contains("inventory, sales, and suppliers"));
        }
        other => panic!("expected conversational text, got {other:?}"),
    }
}

#[tokio::test]
async fn nested_bare_array_payload_renders_as_document() {
    let search = Arc::new(FakeSearch::new(vec![products_tool()]));
    let model = Arc::new(FakeModel::native(
        "search",
        json!({"query": "supplier contracts"}),
    ));
    // A bare array (no envelope) of records nested three levels deep.
    let transport = Arc::new(FakeTransport::ok(json!([
        {
            "supplier": {
                "name": "Fresh Dairy Co.",
                "contacts": [{"role": "sales", "phone": "+31 20 555 0101"}]
            },
            "terms": {"payment": {"net_days": 30, "discount": {"pct": 2}}}
        }
    ])));

    let pipeline = pipeline_with(search, model, transport.clone());
    let reply = pipeline
        .answer("show supplier contract terms", &[], "session-9")
        .await;

    assert!(
        matches!(reply.response, FormattedResponse::Document { .. }),
        "deeply nested records must stay inspectable, got {:?}",
        reply.response
    );
    assert!(!reply.chart.show_chart);
}

#[tokio::test]
async fn detailed_logging_leaves_the_answer_unchanged() {
    let search = Arc::new(FakeSearch::new(vec![products_tool()]));
    let model = Arc::new(FakeModel::native("search", json!({"query": "dairy"})));
    let transport = Arc::new(FakeTransport::ok(json!({
        "success": true,
        "data": dairy_records()
    })));

    let mut config = StocktalkConfig::default();
    config.pipeline.detailed_logging = true;

    let pipeline = pipeline_with_config(search, model, transport.clone(), config);
    let reply = pipeline
        .answer("show me all dairy products", &[], "session-10")
        .await;

    assert_eq!(reply.tool_name.as_deref(), Some("GetProducts"));
    assert_eq!(transport.call_count(), 1);
    assert!(matches!(
        reply.response,
        FormattedResponse::Table { table_data: Some(_), .. }
    ));
}

#[tokio::test]
async fn chart_request_produces_chart_metadata() {
    let search = Arc::new(FakeSearch::new(vec![tool(
        "GetSalesByCategory",
        "Revenue grouped by category",
        "startDate: string, endDate: string",
    )]));
    let model = Arc::new(FakeModel::text_reply("Charting sales."));
    let transport = Arc::new(FakeTransport::ok(json!({
        "success": true,
        "data": [
            {"category": "Dairy", "revenue": 100.0},
            {"category": "Meat", "revenue": 200.0},
            {"category": "Bakery", "revenue": 50.0}
        ]
    })));

    let pipeline = pipeline_with(search, model, transport.clone());
    let reply = pipeline
        .answer("revenue by category as a pie chart", &[], "session-8")
        .await;

    assert!(reply.chart.show_chart);
    assert_eq!(reply.chart.chart_type, ChartType::Pie);
    assert!(!reply.chart.title.is_empty());
}
