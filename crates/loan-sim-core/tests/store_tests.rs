use chrono::NaiveDate;
use loan_sim_core::prepayment::{apply_prepayment, PrepaymentEvent, PrepaymentStrategy};
use loan_sim_core::simulation::{simulate, SimulationInput};
use loan_sim_core::store::{
    FileStore, KeyValueStore, KeyedSimulationStore, MemoryStore, SavedSimulation,
    SimulationStore, SIMULATIONS_KEY,
};
use loan_sim_core::AmortizationMethod;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// A record exactly as the browser front end wrote it to local storage.
const BROWSER_RECORDS: &str = r#"[
  {
    "id": "1717171717171",
    "type": "SAC",
    "date": "31/05/2024",
    "financingAmount": 3300,
    "downPayment": 300,
    "months": 3,
    "monthlyRate": 1,
    "bank": "",
    "firstPayment": 1030,
    "lastPayment": 1010,
    "totalAmount": 3060,
    "totalInterest": 60,
    "installments": [
      {"number": 1, "date": "10/06/2024", "payment": 1030, "amortization": 1000, "interest": 30, "balance": 2000},
      {"number": 2, "date": "10/07/2024", "payment": 1020, "amortization": 1000, "interest": 20, "balance": 1000},
      {"number": 3, "date": "10/08/2024", "payment": 1010, "amortization": 1000, "interest": 10, "balance": 0}
    ]
  },
  {
    "id": "1717171799999",
    "type": "PRICE",
    "date": "01/06/2024",
    "financingAmount": 10000,
    "downPayment": 0,
    "months": 12,
    "monthlyRate": 1.5,
    "bank": "Banco do Brasil",
    "firstPayment": 916.7999,
    "lastPayment": 916.7999,
    "totalAmount": 11001.5988,
    "totalInterest": 1001.5988
  }
]"#;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn browser_store() -> KeyedSimulationStore<MemoryStore> {
    let mut backend = MemoryStore::new();
    backend.set(SIMULATIONS_KEY, BROWSER_RECORDS.to_string()).unwrap();
    KeyedSimulationStore::new(backend)
}

#[test]
fn test_reads_browser_shaped_records() {
    let store = browser_store();
    let all = store.load().unwrap();
    assert_eq!(all.len(), 2);

    let sac = &all[0];
    assert_eq!(sac.method, AmortizationMethod::Sac);
    assert_eq!(sac.date, date(2024, 5, 31));
    assert_eq!(sac.monthly_rate, dec!(1));
    assert_eq!(sac.installments[2].date, date(2024, 8, 10));
    assert_eq!(sac.bank, "");

    // Older records may carry no installment rows at all.
    assert!(all[1].installments.is_empty());
    assert_eq!(all[1].bank, "Banco do Brasil");
}

#[test]
fn test_filter_by_method() {
    let store = browser_store();
    let price = store.filter(Some(AmortizationMethod::Price)).unwrap();
    assert_eq!(price.len(), 1);
    assert_eq!(price[0].id, "1717171799999");
    assert_eq!(store.filter(None).unwrap().len(), 2);
}

#[test]
fn test_stored_record_feeds_prepayment() {
    let store = browser_store();
    let record = store.find("1717171717171").unwrap().unwrap();
    let sim = record.to_simulation().unwrap();

    assert_eq!(sim.principal, dec!(3000));
    assert_eq!(sim.monthly_rate, dec!(0.01));
    assert_eq!(sim.totals.total_interest, dec!(60));
    assert_eq!(sim.bank, None);

    let event = PrepaymentEvent {
        effective_date: date(2024, 7, 1),
        amount: dec!(1000),
        strategy: PrepaymentStrategy::ReduceTerm,
    };
    let out = apply_prepayment(&sim, &event).unwrap().simulation;
    // Opening 2000 - 1000 leaves one 1000 slice, settled in July.
    assert_eq!(out.term_months, 2);
    assert_eq!(out.schedule[1].interest, dec!(10));
    assert_eq!(out.schedule[1].payment, dec!(1010));
    assert_eq!(out.schedule[1].due_date, date(2024, 7, 10));
    assert_eq!(out.totals.total_interest, dec!(40));
}

#[test]
fn test_add_and_delete_roundtrip() {
    let sim = simulate(&SimulationInput {
        method: AmortizationMethod::Price,
        financing_amount: dec!(5000),
        down_payment: dec!(1000),
        term_months: 6,
        monthly_rate: Some(dec!(0.02)),
        annual_rate: None,
        first_due_date: date(2024, 2, 1),
        operation_date: None,
        bank: Some("Itaú".into()),
    })
    .unwrap()
    .result;

    let mut store = browser_store();
    let record = SavedSimulation::from_simulation(&sim, "new-1", date(2024, 1, 20));
    store.add(record).unwrap();

    let reloaded = store.find("new-1").unwrap().unwrap();
    assert_eq!(reloaded.id, "new-1");
    assert_eq!(reloaded.method, AmortizationMethod::Price);
    assert_eq!(reloaded.months, 6);
    assert_eq!(reloaded.monthly_rate, dec!(2));
    assert_eq!(reloaded.bank, "Itaú");
    assert_eq!(store.load().unwrap().len(), 3);

    assert!(store.delete("1717171717171").unwrap());
    let ids: Vec<String> = store.load().unwrap().into_iter().map(|s| s.id).collect();
    assert_eq!(ids, vec!["1717171799999".to_string(), "new-1".to_string()]);
}

#[test]
fn test_file_backed_store_survives_reopen() {
    let path = std::env::temp_dir().join(format!("loan-sim-history-{}.json", std::process::id()));
    let _ = std::fs::remove_file(&path);

    let sim = simulate(&SimulationInput {
        method: AmortizationMethod::Sac,
        financing_amount: dec!(1200),
        down_payment: Decimal::ZERO,
        term_months: 12,
        monthly_rate: Some(dec!(0.01)),
        annual_rate: None,
        first_due_date: date(2024, 1, 1),
        operation_date: None,
        bank: None,
    })
    .unwrap()
    .result;

    {
        let mut store = KeyedSimulationStore::new(FileStore::new(&path));
        store
            .add(SavedSimulation::from_simulation(&sim, "file-1", date(2024, 1, 1)))
            .unwrap();
    }

    let reopened = KeyedSimulationStore::new(FileStore::new(&path));
    let all = reopened.load().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].total_interest, dec!(78));

    let _ = std::fs::remove_file(&path);
}

/// A zero-rate PRICE record: the front end computed 0/0 and stored `null`.
const NULL_AMOUNT_RECORDS: &str = r#"[
  {
    "id": "1",
    "type": "SAC",
    "date": "31/05/2024",
    "financingAmount": 2000,
    "downPayment": 0,
    "months": 2,
    "monthlyRate": 1,
    "bank": "",
    "firstPayment": 1020,
    "lastPayment": 1010,
    "totalAmount": 2030,
    "totalInterest": 30,
    "installments": [
      {"number": 1, "date": "10/06/2024", "payment": 1020, "amortization": 1000, "interest": 20, "balance": 1000},
      {"number": 2, "date": "10/07/2024", "payment": 1010, "amortization": 1000, "interest": 10, "balance": 0}
    ]
  },
  {
    "id": "2",
    "type": "PRICE",
    "date": "01/06/2024",
    "financingAmount": 1000,
    "downPayment": 0,
    "months": 2,
    "monthlyRate": 0,
    "bank": "",
    "firstPayment": null,
    "lastPayment": null,
    "totalAmount": null,
    "totalInterest": null,
    "installments": [
      {"number": 1, "date": "10/06/2024", "payment": null, "amortization": null, "interest": 0, "balance": null},
      {"number": 2, "date": "10/07/2024", "payment": null, "amortization": null, "interest": null, "balance": null}
    ]
  }
]"#;

#[test]
fn test_null_amounts_do_not_break_history() {
    let mut backend = MemoryStore::new();
    backend.set(SIMULATIONS_KEY, NULL_AMOUNT_RECORDS.to_string()).unwrap();
    let mut store = KeyedSimulationStore::new(backend);

    let all = store.load().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].first_payment, Decimal::ZERO);
    assert_eq!(all[1].installments[0].payment, Decimal::ZERO);
    assert_eq!(all[1].installments[1].balance, Decimal::ZERO);

    let healthy = store.find("1").unwrap().unwrap();
    assert_eq!(healthy.total_interest, dec!(30));
    assert!(healthy.to_simulation().is_ok());

    assert!(store.delete("2").unwrap());
    assert_eq!(store.load().unwrap().len(), 1);
}

#[test]
fn test_payoff_at_first_installment_can_be_saved_and_reused() {
    let sim = simulate(&SimulationInput {
        method: AmortizationMethod::Sac,
        financing_amount: dec!(1200),
        down_payment: Decimal::ZERO,
        term_months: 12,
        monthly_rate: Some(dec!(0.01)),
        annual_rate: None,
        first_due_date: date(2024, 1, 10),
        operation_date: None,
        bank: None,
    })
    .unwrap()
    .result;

    let event = PrepaymentEvent {
        effective_date: date(2023, 12, 20),
        amount: dec!(1200),
        strategy: PrepaymentStrategy::ReduceTerm,
    };
    let paid_off = apply_prepayment(&sim, &event).unwrap().simulation;
    assert_eq!(paid_off.term_months, 1);

    let mut store = KeyedSimulationStore::new(MemoryStore::new());
    store
        .add(SavedSimulation::from_simulation(&paid_off, "paid", date(2023, 12, 20)))
        .unwrap();

    let rebuilt = store.find("paid").unwrap().unwrap().to_simulation().unwrap();
    assert_eq!(rebuilt.term_months, 1);
    assert_eq!(rebuilt.first_due_date, date(2024, 1, 10));
    assert_eq!(rebuilt.totals.total_interest, Decimal::ZERO);
    assert_eq!(rebuilt.schedule[0].balance, Decimal::ZERO);
}
