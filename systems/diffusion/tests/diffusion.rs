use euro_diffusion_core::{
    BalanceSheet, CaseDefinition, CellCoord, Command, CountryDefinition, CountryId, Event,
    Territory, INITIAL_BALANCE,
};
use euro_diffusion_system_diffusion::{Diffusion, DiffusionScope};
use euro_diffusion_world::{self as world, query, World};
use proptest::prelude::*;

fn world_for(countries: &[(&str, Territory)]) -> World {
    let definitions = countries
        .iter()
        .map(|(name, territory)| CountryDefinition::new(*name, *territory).expect("valid country"))
        .collect();
    World::new(&CaseDefinition::new(definitions).expect("valid case"))
}

fn classic_world() -> World {
    world_for(&[
        ("France", Territory::new(1, 4, 4, 6)),
        ("Spain", Territory::new(3, 1, 6, 3)),
        ("Portugal", Territory::new(1, 1, 2, 2)),
    ])
}

fn plan_day(world: &mut World, diffusion: Diffusion) -> Vec<Command> {
    let mut events = Vec::new();
    world::apply(world, Command::BeginDay, &mut events);
    let mut commands = Vec::new();
    diffusion.handle(&events, query::case_view(world), &mut commands);
    commands
}

fn apply_all(world: &mut World, commands: Vec<Command>) -> Vec<Event> {
    let mut events = Vec::new();
    for command in commands {
        world::apply(world, command, &mut events);
    }
    events
}

fn run_day(world: &mut World, diffusion: Diffusion) -> Vec<Event> {
    let commands = plan_day(world, diffusion);
    apply_all(world, commands)
}

fn balance(world: &World, row: u32, column: u32) -> Vec<i64> {
    query::city(world, CellCoord::new(row, column))
        .expect("city present")
        .balance
        .amounts()
        .to_vec()
}

#[test]
fn adjacent_cities_exchange_a_thousandth_on_day_one() {
    let mut world = world_for(&[
        ("A", Territory::new(1, 1, 1, 1)),
        ("B", Territory::new(1, 2, 1, 2)),
    ]);

    let events = run_day(&mut world, Diffusion::default());

    assert_eq!(balance(&world, 0, 0), vec![999_000, 1_000]);
    assert_eq!(balance(&world, 1, 0), vec![1_000, 999_000]);
    assert!(events
        .iter()
        .all(|event| !matches!(event, Event::DisperseRejected { .. })));
}

#[test]
fn isolated_cities_keep_their_balance() {
    let mut world = world_for(&[
        ("A", Territory::new(1, 1, 1, 1)),
        ("B", Territory::new(3, 3, 3, 3)),
    ]);

    let commands = plan_day(&mut world, Diffusion::default());
    assert_eq!(commands, vec![Command::SettleDay]);
    let _ = apply_all(&mut world, commands);

    assert_eq!(balance(&world, 0, 0), vec![INITIAL_BALANCE, 0]);
    assert_eq!(balance(&world, 2, 2), vec![0, INITIAL_BALANCE]);
}

#[test]
fn single_country_grid_is_in_equilibrium() {
    let mut world = world_for(&[("A", Territory::new(1, 1, 10, 10))]);

    let _ = run_day(&mut world, Diffusion::default());

    for row in 0..10 {
        for column in 0..10 {
            assert_eq!(balance(&world, row, column), vec![INITIAL_BALANCE]);
        }
    }
}

#[test]
fn row_of_three_matches_hand_computed_second_day() {
    let mut world = world_for(&[
        ("A", Territory::new(1, 1, 2, 1)),
        ("B", Territory::new(3, 1, 3, 1)),
    ]);

    let _ = run_day(&mut world, Diffusion::default());
    assert_eq!(balance(&world, 0, 0), vec![1_000_000, 0]);
    assert_eq!(balance(&world, 0, 1), vec![999_000, 1_000]);
    assert_eq!(balance(&world, 0, 2), vec![1_000, 999_000]);

    let _ = run_day(&mut world, Diffusion::default());
    assert_eq!(balance(&world, 0, 0), vec![999_999, 1]);
    assert_eq!(balance(&world, 0, 1), vec![998_003, 1_997]);
    assert_eq!(balance(&world, 0, 2), vec![1_998, 998_002]);
}

#[test]
fn transfer_order_does_not_change_the_outcome() {
    let mut forward = classic_world();
    let mut reversed = classic_world();

    for _ in 0..5 {
        let commands = plan_day(&mut forward, Diffusion::default());
        let _ = apply_all(&mut forward, commands);

        let mut commands = plan_day(&mut reversed, Diffusion::default());
        let settle = commands.pop().expect("settle command closes the batch");
        assert_eq!(settle, Command::SettleDay);
        commands.reverse();
        commands.push(settle);
        let _ = apply_all(&mut reversed, commands);
    }

    for row in 0..10 {
        for column in 0..10 {
            let cell = CellCoord::new(row, column);
            assert_eq!(
                query::city(&forward, cell).map(|city| city.balance.clone()),
                query::city(&reversed, cell).map(|city| city.balance.clone()),
                "balances diverged at {cell}"
            );
        }
    }
}

#[test]
fn pending_scope_skips_completed_countries() {
    let mut world = world_for(&[
        ("A", Territory::new(1, 1, 1, 1)),
        ("B", Territory::new(1, 2, 1, 2)),
    ]);
    let mut events = Vec::new();
    world::apply(&mut world, Command::BeginDay, &mut events);
    world::apply(
        &mut world,
        Command::MarkCityComplete {
            city: CellCoord::new(0, 0),
        },
        &mut events,
    );
    world::apply(
        &mut world,
        Command::CompleteCountry {
            country: CountryId::new(0),
        },
        &mut events,
    );

    let mut commands = Vec::new();
    Diffusion::new(DiffusionScope::PendingCountries).handle(
        &[Event::DayStarted {
            day: euro_diffusion_core::Day::new(2),
        }],
        query::case_view(&world),
        &mut commands,
    );

    assert_eq!(
        commands,
        vec![
            Command::Disperse {
                city: CellCoord::new(1, 0),
                share: BalanceSheet::from_amounts(vec![0, 1_000]),
                recipients: vec![CellCoord::new(0, 0)],
            },
            Command::SettleDay,
        ]
    );

    let _ = apply_all(&mut world, commands);
    assert_eq!(balance(&world, 0, 0), vec![INITIAL_BALANCE, 1_000]);
    assert_eq!(balance(&world, 1, 0), vec![0, 999_000]);
}

#[test]
fn nothing_is_planned_without_a_new_day() {
    let world = classic_world();
    let mut commands = Vec::new();
    Diffusion::default().handle(&[], query::case_view(&world), &mut commands);
    assert!(commands.is_empty());
}

proptest! {
    #[test]
    fn currency_is_conserved_across_days(days in 1usize..40) {
        let mut world = classic_world();
        let cities: Vec<i64> = query::case_view(&world)
            .countries()
            .map(|country| country.cities.len() as i64)
            .collect();

        for _ in 0..days {
            let _ = run_day(&mut world, Diffusion::default());
        }

        for (index, count) in cities.iter().enumerate() {
            let holdings = query::total_holdings(&world, CountryId::new(index as u32));
            prop_assert_eq!(holdings, count * INITIAL_BALANCE);
        }
    }
}
