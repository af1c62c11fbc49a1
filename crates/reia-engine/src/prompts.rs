use reia_models::chat::ChatMessage;
use reia_models::property::Property;
use serde_json::json;

/// Shape the model is asked to reply with.
fn response_schema() -> String {
    let example = json!({
        "analysis": [
            {
                "property_id": "<id from input>",
                "noi": 0.0,
                "cap_rate": 0.0,
                "score": 0.0,
                "recommendation": "<buy, hold or pass with one sentence of reasoning>"
            }
        ]
    });
    serde_json::to_string_pretty(&example).unwrap_or_default()
}

pub fn system_prompt() -> String {
    "You are a financial intelligence engine for real estate investment. You evaluate \
     income properties on net operating income, capitalization rate, market position and \
     risk, and you always answer with a single JSON object and no other text."
        .to_string()
}

/// Raw and derived figures for every property, as embedded in the prompt.
pub fn property_payload(properties: &[Property], down_payment_percent: f64) -> serde_json::Value {
    let rows: Vec<serde_json::Value> = properties
        .iter()
        .map(|p| {
            json!({
                "id": p.id,
                "address": p.address,
                "purchase_price": p.purchase_price,
                "annual_rent": p.annual_rent,
                "operating_expenses": p.operating_expenses,
                "market_cap_rate": p.market_cap_rate,
                "calculated_noi": p.noi(),
                "calculated_cap_rate": p.cap_rate(),
                "cash_on_cash_return": p.cash_on_cash_return(down_payment_percent),
            })
        })
        .collect();
    serde_json::Value::Array(rows)
}

pub fn analysis_prompt(properties: &[Property], down_payment_percent: f64) -> String {
    let payload = property_payload(properties, down_payment_percent);
    let payload = serde_json::to_string_pretty(&payload).unwrap_or_default();

    format!(
        "Analyze these properties and provide investment recommendations.\n\n\
         Properties:\n{payload}\n\n\
         For each property, calculate:\n\
         1. NOI (Net Operating Income = Annual Rent - Operating Expenses)\n\
         2. Cap Rate (NOI / Purchase Price, as a percentage)\n\
         3. Investment Score (0-100 based on cap rate, market position, and risk)\n\
         4. Brief recommendation (buy, hold, or pass with reasoning)\n\n\
         Use each property's `id` as `property_id`. Return JSON in exactly this format:\n{}",
        response_schema()
    )
}

pub fn analysis_messages(properties: &[Property], down_payment_percent: f64) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(system_prompt()),
        ChatMessage::user(analysis_prompt(properties, down_payment_percent)),
    ]
}
