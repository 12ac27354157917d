use std::str::FromStr;

use chrono::NaiveDate;
use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use loan_sim_core::prepayment::{PrepaymentEvent, PrepaymentInput};
use loan_sim_core::rates::RateConversionInput;
use loan_sim_core::simulation::{Simulation, SimulationInput};
use loan_sim_core::store::{FileStore, KeyedSimulationStore, SavedSimulation, SimulationStore};
use loan_sim_core::AmortizationMethod;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_rate(rate: &str) -> NapiResult<Decimal> {
    Decimal::from_str(rate.trim()).map_err(to_napi_error)
}

fn open_store(store_path: String) -> KeyedSimulationStore<FileStore> {
    KeyedSimulationStore::new(FileStore::new(store_path))
}

// ---------------------------------------------------------------------------
// Rates
// ---------------------------------------------------------------------------

/// Monthly effective rate (decimal string) to its annual equivalent.
#[napi]
pub fn monthly_to_annual(monthly_rate: String) -> NapiResult<String> {
    let annual = loan_sim_core::rates::monthly_to_annual(parse_rate(&monthly_rate)?)
        .map_err(to_napi_error)?;
    Ok(annual.to_string())
}

/// Annual effective rate (decimal string) to its monthly equivalent.
#[napi]
pub fn annual_to_monthly(annual_rate: String) -> NapiResult<String> {
    let monthly = loan_sim_core::rates::annual_to_monthly(parse_rate(&annual_rate)?)
        .map_err(to_napi_error)?;
    Ok(monthly.to_string())
}

#[napi]
pub fn convert_rate(input_json: String) -> NapiResult<String> {
    let input: RateConversionInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loan_sim_core::rates::convert_rate(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Schedules
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ScheduleRequest {
    #[serde(default)]
    method: AmortizationMethod,
    principal: Decimal,
    term_months: u32,
    monthly_rate: Decimal,
    first_due_date: NaiveDate,
}

/// Bare installment rows, without totals or the output envelope.
#[napi]
pub fn generate_schedule(input_json: String) -> NapiResult<String> {
    let req: ScheduleRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let rows = loan_sim_core::schedule::generate_schedule(
        req.method,
        req.principal,
        req.term_months,
        req.monthly_rate,
        req.first_due_date,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&rows).map_err(to_napi_error)
}

#[napi]
pub fn simulate(input_json: String) -> NapiResult<String> {
    let input: SimulationInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loan_sim_core::simulation::simulate(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compare_methods(input_json: String) -> NapiResult<String> {
    let input: SimulationInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loan_sim_core::comparison::compare_methods(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Prepayment
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SinglePrepayment {
    simulation: Simulation,
    event: PrepaymentEvent,
}

/// One event; returns the updated simulation and its outcome.
#[napi]
pub fn apply_prepayment(input_json: String) -> NapiResult<String> {
    let req: SinglePrepayment = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let application = loan_sim_core::prepayment::apply_prepayment(&req.simulation, &req.event)
        .map_err(to_napi_error)?;
    serde_json::to_string(&application).map_err(to_napi_error)
}

#[napi]
pub fn process_prepayments(input_json: String) -> NapiResult<String> {
    let input: PrepaymentInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        loan_sim_core::prepayment::process_prepayments(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SaveRequest {
    id: String,
    saved_on: NaiveDate,
    simulation: Simulation,
}

#[derive(Debug, Serialize)]
struct DeleteResponse {
    id: String,
    deleted: bool,
}

/// Saved records, optionally only one method ("PRICE" or "SAC").
#[napi]
pub fn history_list(store_path: String, method: Option<String>) -> NapiResult<String> {
    let method = method
        .map(|m| AmortizationMethod::from_str(&m))
        .transpose()
        .map_err(to_napi_error)?;
    let records = open_store(store_path).filter(method).map_err(to_napi_error)?;
    serde_json::to_string(&records).map_err(to_napi_error)
}

/// Snapshot a simulation into the history file; returns the stored record.
#[napi]
pub fn history_add(store_path: String, input_json: String) -> NapiResult<String> {
    let req: SaveRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let record = SavedSimulation::from_simulation(&req.simulation, req.id, req.saved_on);
    open_store(store_path)
        .add(record.clone())
        .map_err(to_napi_error)?;
    serde_json::to_string(&record).map_err(to_napi_error)
}

#[napi]
pub fn history_delete(store_path: String, id: String) -> NapiResult<String> {
    let deleted = open_store(store_path).delete(&id).map_err(to_napi_error)?;
    serde_json::to_string(&DeleteResponse { id, deleted }).map_err(to_napi_error)
}
