use holdem_advisor::action::{Action, ScriptedActions};
use holdem_advisor::betting::{BettingError, RoundState, Table};
use proptest::prelude::*;

fn mk_table(names: &[&str], balance: u64) -> Table {
    let mut table = Table::new(balance);
    for name in names {
        table.add_player(*name).unwrap();
    }
    // put the dealer in the last seat so seat 0 acts first
    for _ in 1..names.len() {
        table.rotate_dealer();
    }
    table
}

fn seat(table: &Table, name: &str) -> RoundState {
    RoundState::AwaitingAction(table.seat_of(name).unwrap())
}

fn pot_matches_contributions(table: &Table) -> bool {
    table.pot_total() == table.players().iter().map(|p| p.contributed()).sum::<u64>()
}

#[test]
fn bet_after_check_requires_the_checker_to_act_again() {
    let mut t = mk_table(&["A", "B", "C"], 100);
    assert_eq!(t.start_round().unwrap(), seat(&t, "A"));
    t.act("A", Action::Check).unwrap();
    t.act("B", Action::Bet(10)).unwrap();
    assert_eq!(t.act("C", Action::Call).unwrap(), seat(&t, "A"));
    assert_eq!(t.turn().unwrap().to_call, 10);
    assert_eq!(t.act("A", Action::Call).unwrap(), RoundState::RoundComplete);

    assert_eq!(t.pot_total(), 30);
    for p in t.players() {
        assert_eq!(p.current_bet(), 10);
        assert_eq!(p.balance(), 90);
    }
}

#[test]
fn raise_reopens_action_for_earlier_callers() {
    let mut t = mk_table(&["A", "B", "C"], 100);
    t.start_round().unwrap();
    t.apply(Action::Bet(10)).unwrap();
    t.apply(Action::Raise(20)).unwrap();
    assert_eq!(t.round().unwrap().highest_bet(), 20);
    assert_eq!(t.apply(Action::Call).unwrap(), seat(&t, "A"));
    assert_eq!(t.apply(Action::Call).unwrap(), RoundState::RoundComplete);
    assert_eq!(t.pot_total(), 60);
    assert!(pot_matches_contributions(&t));
}

#[test]
fn folding_to_one_player_ends_round_and_awards_pot() {
    let mut t = mk_table(&["A", "B", "C"], 100);
    t.start_round().unwrap();
    t.apply(Action::Bet(10)).unwrap();
    assert_eq!(t.apply(Action::Fold).unwrap(), seat(&t, "C"));
    assert_eq!(t.apply(Action::Fold).unwrap(), RoundState::RoundComplete);

    assert_eq!(t.resolve(None).unwrap(), ("A".to_string(), 10));
    assert_eq!(t.player("A").unwrap().balance(), 100);
    assert_eq!(t.pot_total(), 0);
}

#[test]
fn bets_reset_between_streets_while_pot_carries_over() {
    let mut t = mk_table(&["A", "B", "C"], 100);
    let mut preflop: ScriptedActions = "check; check; check".parse().unwrap();
    t.run_round(&mut preflop).unwrap();

    let mut flop: ScriptedActions = "bet 5; call; fold".parse().unwrap();
    t.run_round(&mut flop).unwrap();
    assert_eq!(t.pot_total(), 10);

    assert_eq!(t.start_round().unwrap(), seat(&t, "A"));
    assert_eq!(t.round().unwrap().active(), &[0, 1]);
    assert!(t.round().unwrap().folded().contains(&2));
    let a = t.player("A").unwrap();
    assert_eq!((a.current_bet(), a.contributed()), (0, 5));

    t.apply(Action::Check).unwrap();
    assert_eq!(t.apply(Action::Check).unwrap(), RoundState::RoundComplete);
    assert_eq!(t.resolve(None), Err(BettingError::NoWinner(2)));
    assert_eq!(t.resolve(Some("B")).unwrap(), ("B".to_string(), 10));
    assert_eq!(t.player("B").unwrap().balance(), 105);
    assert!(t.players().iter().all(|p| !p.is_folded() && p.contributed() == 0));
    assert!(t.history().is_empty());
}

#[test]
fn scripted_round_reports_rejections_and_retries() {
    let mut t = mk_table(&["A", "B", "C"], 100);
    let mut script: ScriptedActions = "check; bet 10; check; call; call".parse().unwrap();
    t.run_round(&mut script).unwrap();

    assert_eq!(t.pot_total(), 30);
    assert_eq!(script.remaining(), 0);
    assert_eq!(
        script.rejections(),
        &[("C".to_string(), Action::Check, BettingError::IllegalCheck { owed: 10 })]
    );
    let verbs: Vec<Action> = t.history().iter().map(|h| h.action).collect();
    assert_eq!(verbs, vec![Action::Check, Action::Bet(10), Action::Call, Action::Call]);
    assert_eq!(t.history()[2].paid, 10);
}

#[test]
fn script_running_dry_abandons_the_round() {
    let mut t = mk_table(&["A", "B"], 100);
    let mut script: ScriptedActions = "bet 10".parse().unwrap();
    assert_eq!(t.run_round(&mut script), Err(BettingError::NoAction("B".into())));
    assert_eq!(t.state(), Some(seat(&t, "B")));
}

#[test]
fn action_order_follows_the_dealer_button() {
    let mut t = mk_table(&["A", "B", "C"], 100);
    assert_eq!(t.action_order(), vec![0, 1, 2]);
    t.rotate_dealer();
    assert_eq!(t.action_order(), vec![1, 2, 0]);
    assert_eq!(t.start_round().unwrap(), seat(&t, "B"));
}

#[test]
fn unknown_winner_keeps_the_pot() {
    let mut t = mk_table(&["A", "B"], 100);
    t.start_round().unwrap();
    t.apply(Action::Bet(10)).unwrap();
    t.apply(Action::Call).unwrap();
    assert_eq!(t.resolve(Some("Z")), Err(BettingError::PlayerNotFound("Z".into())));
    assert_eq!(t.pot_total(), 20);
}

fn any_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        (0u64..150).prop_map(Action::Bet),
        (0u64..150).prop_map(Action::Raise),
        Just(Action::Call),
        Just(Action::Check),
        Just(Action::Fold),
    ]
}

proptest! {
    #[test]
    fn chips_are_conserved_and_rejections_are_atomic(
        players in 2usize..6,
        actions in prop::collection::vec(any_action(), 1..80),
    ) {
        let names = ["A", "B", "C", "D", "E"];
        let mut t = mk_table(&names[..players], 100);
        t.start_round().unwrap();

        for action in actions {
            if t.state() == Some(RoundState::RoundComplete) {
                if t.live_players().count() < 2 {
                    break;
                }
                t.start_round().unwrap();
            }
            let before = t.clone();
            match t.apply(action) {
                Ok(_) => prop_assert_eq!(t.history().len(), before.history().len() + 1),
                Err(_) => prop_assert_eq!(&t, &before),
            }

            prop_assert!(pot_matches_contributions(&t));
            let highest = t.round().map_or(0, |r| r.highest_bet());
            for p in t.players() {
                prop_assert_eq!(p.balance() + p.contributed(), 100);
                prop_assert!(p.current_bet() <= highest);
            }
        }
    }
}
