use annual_report_analyzer::*;
use chrono::NaiveDate;

const FIXTURE: &str = include_str!("fixtures/annual_report.xhtml");

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
}

fn analyze(status: Option<&RegistrationStatus>) -> anyhow::Result<AnnualReport> {
    Ok(analyze_document(
        FIXTURE,
        &AnalysisConfig::default(),
        status,
        as_of(),
    )?)
}

fn assert_close(actual: Option<f64>, expected: f64) {
    let actual = actual.expect("value should be present");
    assert!(
        (actual - expected).abs() < 0.01,
        "expected {}, got {}",
        expected,
        actual
    );
}

#[test]
fn test_metadata_and_taxonomies() -> anyhow::Result<()> {
    let report = analyze(None)?;

    assert_eq!(
        report.metadata.company_name.as_deref(),
        Some("Exempelbolaget i Uppsala AB")
    );
    assert_eq!(report.metadata.organisation_number.as_deref(), Some("556123-4567"));
    assert_eq!(report.metadata.registered_seat.as_deref(), Some("Uppsala"));
    assert_eq!(
        report.metadata.fiscal_year_end_date(),
        NaiveDate::from_ymd_opt(2023, 12, 31)
    );

    let categories: Vec<TaxonomyCategory> = report.taxonomies.iter().map(|t| t.category).collect();
    assert_eq!(
        categories,
        vec![
            TaxonomyCategory::IndividualK2,
            TaxonomyCategory::AuditReport,
            TaxonomyCategory::Certification
        ]
    );
    assert!(report.taxonomy_warnings.is_empty());
    assert!(!report.consolidated);
    assert!(report.group_ratios.is_none());

    Ok(())
}

#[test]
fn test_key_ratios_and_multi_year() -> anyhow::Result<()> {
    let report = analyze(None)?;
    let ratios = &report.key_ratios;

    assert_close(ratios.revenue, 4_250_000.0);
    assert_close(ratios.result_after_financial_items, 620_000.0);
    assert_close(ratios.net_income, 492_280.0);
    assert_close(ratios.equity, 1_100_000.0);
    assert_close(ratios.total_assets, 2_200_000.0);
    assert_close(ratios.solvency_pct, 50.0);
    assert_close(ratios.profit_margin_pct, 11.58);
    assert_close(ratios.return_on_equity_pct, 44.75);
    assert_close(ratios.employees, 6.0);

    assert_eq!(report.multi_year.len(), 3);
    assert_close(report.multi_year[1].solvency_pct, 47.4);
    assert_close(report.multi_year[2].revenue, 3_100_000.0);
    assert_eq!(report.multi_year[2].equity, None);

    Ok(())
}

#[test]
fn test_statements() -> anyhow::Result<()> {
    let report = analyze(None)?;

    let income = &report.income_statement;
    assert_eq!(income.context_id, "period0");
    assert_close(income.get("net_revenue"), 4_250_000.0);
    assert_close(income.get("personnel_expenses"), -2_300_000.0);
    assert_close(income.get("tax"), -127_720.0);
    assert_close(income.get("net_income"), 492_280.0);
    assert_eq!(income.get("goods_for_resale"), None);

    let balance = &report.balance_sheet;
    assert_eq!(balance.context_id, "balans0");
    assert_close(balance.get("cash_and_bank"), 1_150_000.0);
    assert_close(balance.get("total_assets"), 2_200_000.0);
    assert_close(balance.get("total_equity"), 1_100_000.0);
    assert_close(balance.get("share_capital"), 25_000.0);
    assert_eq!(balance.get("inventories"), None);

    Ok(())
}

#[test]
fn test_people_and_signatures() -> anyhow::Result<()> {
    let report = analyze(None)?;
    let roster = &report.roster;

    assert_eq!(roster.ceo.as_ref().map(|p| p.full_name()).as_deref(), Some("Anna Berg"));
    let board: Vec<String> = roster.board.iter().map(|p| p.full_name()).collect();
    assert_eq!(board, vec!["Erik Lund", "Maria Nilsson"]);
    assert_eq!(roster.auditors.len(), 1);
    assert_eq!(roster.auditors[0].title.as_deref(), Some("Auktoriserad revisor"));

    let audit = report.audit_report.as_ref().expect("audit report");
    assert_eq!(audit.auditor_name.as_deref(), Some("Johan Ek"));
    assert_eq!(audit.audit_firm.as_deref(), Some("Revisionsbyrån Ek AB"));
    assert_eq!(audit.date.as_deref(), Some("2024-04-20"));
    assert!(audit.clean);
    assert!(audit.opinion_annual_report.is_some());
    assert_eq!(audit.kind, AuditReportKind::Standard);

    let cert = report.certification.as_ref().expect("certification");
    assert_eq!(cert.certification_date.as_deref(), Some("2024-05-30"));
    assert_eq!(cert.agm_date.as_deref(), Some("2024-05-25"));
    assert_eq!(cert.signatories, vec!["Anna Berg", "Erik Lund"]);
    assert!(cert.balance_sheet_adopted);
    assert!(!cert.esef);

    Ok(())
}

#[test]
fn test_management_report() -> anyhow::Result<()> {
    let report = analyze(None)?;
    let management = &report.management_report;

    let general = management.general_business.as_deref().unwrap_or_default();
    assert!(general.starts_with("Bolaget utvecklar och säljer programvara"));
    assert!(general.ends_with("säte i Uppsala."));
    assert!(management.significant_events.is_some());
    assert!(management.profit_appropriation.is_some());
    assert_eq!(management.expected_development, None);

    Ok(())
}

#[test]
fn test_bas_mapping() -> anyhow::Result<()> {
    let report = analyze(None)?;

    let cash = report
        .bas_chart
        .for_context("balans0")
        .find(|m| m.concept == "KassaBank")
        .expect("cash mapped");
    assert_eq!(cash.account_range, "19xx");
    assert_eq!(cash.value, 1_150_000.0);

    let revenue = report
        .bas_chart
        .for_context("period0")
        .find(|m| m.concept == "Nettoomsattning")
        .expect("revenue mapped");
    assert_eq!(revenue.account_range, "30xx-37xx");

    assert!(!report
        .bas_chart
        .mappings
        .iter()
        .any(|m| m.concept == "MedelantalAnstallda"));

    Ok(())
}

#[test]
fn test_healthy_company_has_no_flags() -> anyhow::Result<()> {
    let report = analyze(None)?;

    assert!(report.risk.flags.is_empty());
    assert_eq!(report.risk.score, 0);
    assert_eq!(report.risk.level, RiskLevel::Low);

    Ok(())
}

#[test]
fn test_register_status_adds_flags() -> anyhow::Result<()> {
    let status = RegistrationStatus {
        registration_date: NaiveDate::from_ymd_opt(2010, 3, 1),
        ..Default::default()
    }
    .with_proceedings(vec![Proceeding::new("LI", NaiveDate::from_ymd_opt(2024, 6, 1))]);

    let report = analyze(Some(&status))?;

    assert_eq!(report.risk.flags.len(), 1);
    assert_eq!(report.risk.flags[0].kind, RiskKind::PendingLiquidation);
    assert_eq!(report.risk.score, 3);
    assert_eq!(report.risk.level, RiskLevel::High);

    Ok(())
}

#[test]
fn test_trends_over_multi_year_overview() -> anyhow::Result<()> {
    let report = analyze(None)?;
    let trends = &report.trends;

    assert_eq!(trends.periods, vec!["period0", "period1", "period2"]);
    assert_close(trends.revenue.cagr_pct, 17.09);
    assert_close(trends.revenue.forecast, 4_866_666.67);
    assert_close(trends.equity.cagr_pct, 22.22);

    Ok(())
}

#[test]
fn test_trends_across_filed_reports() -> anyhow::Result<()> {
    let current = analyze(None)?;
    let snapshots = vec![
        PeriodSnapshot {
            period: current.metadata.fiscal_year_end.clone().unwrap_or_default(),
            ratios: current.key_ratios.clone(),
        },
        PeriodSnapshot {
            period: "2022-12-31".to_string(),
            ratios: KeyRatios {
                revenue: Some(3_400_000.0),
                equity: Some(880_000.0),
                ..Default::default()
            },
        },
    ];

    let trends = TrendAnalysis::from_snapshots(snapshots);
    assert_close(trends.revenue.cagr_pct, 25.0);
    assert_close(trends.equity.cagr_pct, 25.0);
    assert_eq!(trends.net_income.cagr_pct, None);

    let json = trends.to_json()?;
    assert!(json.contains("2023-12-31"));

    Ok(())
}

#[test]
fn test_precision_lookup() -> anyhow::Result<()> {
    let document = InlineDocument::parse(FIXTURE)?;

    let exact = document
        .value_with_precision("Nettoomsattning", Some("period0"))
        .expect("revenue");
    assert_eq!(exact.precision_label(), "exact");
    assert_eq!(exact.unit, "SEK");

    let rounded = document
        .value_with_precision("Nettoomsattning", Some("period2"))
        .expect("revenue two years back");
    assert_eq!(rounded.value, 3_100_000.0);
    assert_eq!(rounded.decimals, Some(-3));
    assert_eq!(rounded.scale, 3);

    Ok(())
}

#[test]
fn test_report_serializes() -> anyhow::Result<()> {
    let report = analyze(None)?;
    let json = report.to_json()?;

    let value: serde_json::Value = serde_json::from_str(&json)?;
    assert_eq!(value["metadata"]["company_name"], "Exempelbolaget i Uppsala AB");
    assert_eq!(value["risk"]["level"], "low");

    Ok(())
}
