use house_fairness::builder::Builder;
use house_fairness::*;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn cycle_2014() -> ElectionCycle {
    ElectionCycle::new(2014).unwrap()
}

fn race(
    b: &mut Builder,
    state: &str,
    state_name: &str,
    district: &str,
    winner: (&str, &str, &str),
    loser: Option<(&str, &str, &str)>,
) {
    let (name, party, votes) = winner;
    b.add_row(RawCandidateRow::new(state, state_name, district, party, name, votes).winner());
    if let Some((name, party, votes)) = loser {
        b.add_row(RawCandidateRow::new(
            state, state_name, district, party, name, votes,
        ));
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn validation_with_partial_apportionment() {
    init();
    let mut b = Builder::new(cycle_2014())
        .apportionment(2010, "Vermont", 625_741, 1)
        .vote_share("VT", 60, 40, 0)
        .vote_share("DE", 45, 55, 0);
    race(
        &mut b,
        "VT",
        "Vermont",
        "00",
        ("Ann", "D", "60"),
        Some(("Bob", "R", "40")),
    );
    race(
        &mut b,
        "DE",
        "Delaware",
        "00",
        ("Cid", "R", "55"),
        Some(("Dee", "D", "45")),
    );
    let report = b.run();

    assert_eq!(
        report.warnings,
        vec![Warning::MissingApportionmentState {
            state: "DE".to_string(),
            name: "Delaware".to_string(),
            decade: 2010,
        }]
    );
    let ids: Vec<&str> = report
        .result
        .states
        .iter()
        .map(|s| s.tally.id.as_str())
        .collect();
    assert_eq!(ids, vec!["DE", "VT"]);
}

#[test]
fn missing_decade_skips_validation() {
    init();
    let mut b = Builder::new(cycle_2014())
        .apportionment(2000, "Vermont", 608_827, 1)
        .vote_share("VT", 60, 40, 0)
        .vote_share("DE", 45, 55, 0);
    race(&mut b, "VT", "Vermont", "00", ("Ann", "D", "60"), None);
    race(&mut b, "DE", "Delaware", "00", ("Cid", "R", "55"), None);
    let report = b.run();

    let cannot_validate: Vec<&Warning> = report
        .warnings
        .iter()
        .filter(|w| w.is_cannot_validate())
        .collect();
    assert_eq!(
        cannot_validate,
        vec![&Warning::MissingApportionmentDecade {
            year: 2014,
            decade: 2010
        }]
    );
    assert_eq!(report.result.states.len(), 2);
}

#[test]
fn apportionment_mismatch_is_reported() {
    init();
    let mut b = Builder::new(cycle_2014())
        .apportionment(2010, "Connecticut", 3_574_097, 2)
        .vote_share("CT", 60, 40, 0);
    race(
        &mut b,
        "CT",
        "Connecticut",
        "01",
        ("Ann", "D", "60"),
        Some(("Bob", "R", "40")),
    );
    let report = b.run();
    assert_eq!(
        report.warnings,
        vec![Warning::ApportionmentMismatch {
            state: "CT".to_string(),
            expected: 2,
            actual: 1
        }]
    );
    assert_eq!(report.result.states.len(), 1);
}

#[test]
fn ranking_by_efficiency_gap_seats() {
    init();
    let mut b = Builder::new(cycle_2014())
        .vote_share("CT", 60, 40, 0)
        .vote_share("ID", 30, 70, 0)
        .vote_share("AK", 40, 50, 10);
    race(
        &mut b,
        "CT",
        "Connecticut",
        "01",
        ("Ann", "D", "60"),
        Some(("Bob", "R", "40")),
    );
    race(
        &mut b,
        "ID",
        "Idaho",
        "01",
        ("Cid", "R", "70"),
        Some(("Dee", "D", "30")),
    );
    race(&mut b, "AK", "Alaska", "00", ("Eve", "R", "Unopposed"), None);
    let report = b.run();
    let states = &report.result.states;

    let ids: Vec<&str> = states.iter().map(|s| s.tally.id.as_str()).collect();
    assert_eq!(ids, vec!["ID", "CT", "AK"]);
    assert!(close(states[0].efficiency_gap_d.unwrap(), -0.11));
    assert!(close(states[1].efficiency_gap_d.unwrap(), 0.31));
    assert_eq!(states[2].efficiency_gap_d, None);
    assert_eq!(states[2].efficiency_gap_seats_d, None);
    assert!(close(report.result.total_efficiency_gap_seats_d, 0.2));
}

#[test]
fn missing_vote_share_excludes_state() {
    init();
    let mut b = Builder::new(cycle_2014())
        .apportionment(2010, "Connecticut", 3_574_097, 1)
        .apportionment(2010, "Idaho", 1_567_582, 1)
        .vote_share("CT", 60, 40, 0);
    race(&mut b, "CT", "Connecticut", "01", ("Ann", "D", "60"), None);
    race(&mut b, "ID", "Idaho", "01", ("Cid", "R", "70"), None);
    let report = b.run();

    assert_eq!(
        report.warnings,
        vec![Warning::MissingVoteShare {
            state: "ID".to_string()
        }]
    );
    assert_eq!(report.result.states.len(), 1);
    assert_eq!(report.result.states[0].tally.id, "CT");
}

#[test]
fn state_counts() {
    init();
    let mut b = Builder::new(cycle_2014()).vote_share("NY", 50, 45, 5);
    // 01: unopposed Democrat, on two lines.
    b.add_row(RawCandidateRow::new("NY", "New York", "01", "D", "Ann", "Unopposed").winner());
    b.add_row(RawCandidateRow::new("NY", "New York", "01", "WF", "Ann", "Unopposed").winner());
    // 02: Republican.
    race(
        &mut b,
        "NY",
        "New York",
        "02",
        ("Bob", "R", "1,000"),
        Some(("Cal", "D", "900")),
    );
    // 03: independent winner.
    race(
        &mut b,
        "NY",
        "New York",
        "03",
        ("Dan", "IND", "500"),
        Some(("Eli", "R", "400")),
    );
    // 04: nobody flagged.
    b.add_row(RawCandidateRow::new("NY", "New York", "04", "D", "Fay", "300"));
    // metadata row.
    b.add_row(RawCandidateRow::new("NY", "New York", "H", "D", "Total", "9,999").winner());
    // outside the 50 states.
    b.add_row(RawCandidateRow::new("GU", "Guam", "00", "D", "Gus", "100").winner());
    let report = b.run();

    assert_eq!(report.result.states.len(), 1);
    let ny = &report.result.states[0];
    assert_eq!(
        ny.tally.num_reps,
        RepCounts {
            d: 1,
            r: 1,
            other: 1,
            unopposed: 1
        }
    );
    assert_eq!(ny.tally.num_reps.total() as usize, ny.tally.winners.len());
    let winners: Vec<&str> = ny
        .tally
        .winners
        .iter()
        .map(|w| w.record.name.as_str())
        .collect();
    assert_eq!(winners, vec!["Ann", "Bob", "Dan"]);
    assert_eq!(ny.tally.winners[0].other_parties, vec!["WF".to_string()]);
    assert_eq!(ny.tally.qualifying_districts, 1);

    assert!(report.warnings.contains(&Warning::NoWinner {
        state: "NY".to_string(),
        district: 4
    }));
    assert!(report.warnings.contains(&Warning::AmbiguousMajorParty {
        state: "NY".to_string(),
        district: 3,
        name: "Dan".to_string(),
        party: "IND".to_string(),
    }));
    assert!(report
        .warnings
        .iter()
        .any(|w| matches!(w, Warning::MissingApportionmentDecade { .. })));
}

#[test]
fn popular_representation_delta() {
    init();
    let mut b = Builder::new(cycle_2014())
        .vote_share("CT", 50, 50, 0)
        .vote_share("KS", 30, 60, 10);
    for d in ["01", "02", "03", "04"] {
        race(&mut b, "CT", "Connecticut", d, ("D Rep", "D", "10"), None);
    }
    for d in ["01", "02", "03"] {
        race(&mut b, "KS", "Kansas", d, ("R Rep", "R", "10"), None);
    }
    let report = b.run();
    let result = &report.result;

    let ct = result.states.iter().find(|s| s.tally.id == "CT").unwrap();
    assert_eq!(ct.popular_vote_seats_d, 2);
    assert_eq!(ct.popular_representation_delta, 2);
    // round(0.3 * 3) = 1
    let ks = result.states.iter().find(|s| s.tally.id == "KS").unwrap();
    assert_eq!(ks.popular_vote_seats_d, 1);
    assert_eq!(ks.popular_representation_delta, -1);

    assert_eq!(result.total_popular_representation_delta, 1);
    let ranked: Vec<&str> = result
        .ranked_by_popular_representation()
        .iter()
        .map(|s| s.tally.id.as_str())
        .collect();
    assert_eq!(ranked, vec!["KS", "CT"]);
}

#[test]
fn identical_input_gives_identical_output() {
    init();
    let build = || {
        let mut b = Builder::new(cycle_2014())
            .apportionment(2010, "Connecticut", 3_574_097, 2)
            .vote_share("CT", 60, 40, 0)
            .vote_share("ID", 30, 70, 0);
        race(
            &mut b,
            "CT",
            "Connecticut",
            "01",
            ("Ann", "D", "60"),
            Some(("Bob", "R", "40")),
        );
        race(
            &mut b,
            "CT",
            "Connecticut",
            "02",
            ("Cy", "R", "52"),
            Some(("Di", "D", "48")),
        );
        race(
            &mut b,
            "ID",
            "Idaho",
            "01",
            ("Cid", "R", "70"),
            Some(("Dee", "D", "30")),
        );
        b
    };
    let first = build().run();
    let second = build().run();
    assert_eq!(format!("{:?}", first), format!("{:?}", second));
    assert_eq!(first, second);
}

#[test]
fn zero_statewide_votes_excludes_state() {
    init();
    let mut b = Builder::new(cycle_2014())
        .apportionment(2010, "Connecticut", 3_574_097, 1)
        .vote_share("CT", 0, 0, 0);
    race(
        &mut b,
        "CT",
        "Connecticut",
        "01",
        ("Ann", "D", "60"),
        Some(("Bob", "R", "40")),
    );
    let report = b.run();

    assert_eq!(
        report.warnings,
        vec![Warning::MissingVoteShare {
            state: "CT".to_string()
        }]
    );
    assert!(report.result.states.is_empty());
    assert_eq!(report.result.total_popular_representation_delta, 0);
}

#[test]
fn huge_vote_counts_leave_the_district_out() {
    init();
    let mut b = Builder::new(cycle_2014())
        .apportionment(2010, "Connecticut", 3_574_097, 2)
        .vote_share("CT", 60, 40, 0);
    race(
        &mut b,
        "CT",
        "Connecticut",
        "01",
        ("Ann", "D", "10,000,000,000,000,000,000"),
        Some(("Bob", "R", "9,000,000,000,000,000,000")),
    );
    race(
        &mut b,
        "CT",
        "Connecticut",
        "02",
        ("Cy", "D", "60"),
        Some(("Di", "R", "40")),
    );
    let report = b.run();

    assert!(report.warnings.is_empty());
    let ct = &report.result.states[0];
    assert_eq!(ct.tally.num_reps.d, 2);
    assert_eq!(ct.tally.qualifying_districts, 1);
    assert_eq!(ct.tally.wasted.total_dr, 100);
    assert!(close(ct.efficiency_gap_d.unwrap(), 0.31));
}
