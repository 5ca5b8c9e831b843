use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};

use liquidsim::labware::presets;
use liquidsim::{
    next_robot_state_and_warnings, simulate_timeline, Command, InvariantContext, Mount, PipetteEntity, RobotState,
};

fn make_context() -> InvariantContext {
    InvariantContext::builder()
        .pipette(PipetteEntity::multi("p300Multi", Mount::Right, 300.0))
        .labware("trough", presets::reservoir_12())
        .labware("plate", presets::well_plate_96())
        .labware("tiprack", presets::tiprack_96(300.0))
        .labware("trash", presets::fixed_trash())
        .build()
        .unwrap()
}

// One column of the plate per tip: fill all 12 columns from the trough.
fn plate_fill() -> Vec<Command> {
    let mut commands = Vec::new();
    for col in 1..=12 {
        commands.push(Command::pick_up_tip("p300Multi", "tiprack", format!("A{col}")));
        commands.push(Command::aspirate("p300Multi", "trough", "A1", 100.0));
        commands.push(Command::dispense("p300Multi", "plate", format!("A{col}"), 100.0));
        commands.push(Command::blowout("p300Multi", "plate", format!("A{col}")));
        commands.push(Command::drop_tip("p300Multi", "trash", "A1"));
    }
    commands
}

fn bench_sequencer(c: &mut Criterion) {
    let ctx = make_context();
    let start = RobotState::builder(&ctx)
        .well_liquid("trough", "A1", "buffer", 20_000.0)
        .build()
        .unwrap();
    let commands = plate_fill();

    let mut group = c.benchmark_group("sequencer");
    group.throughput(Throughput::Elements(commands.len() as u64));

    group.bench_function("plate_fill", |b| {
        b.iter(|| next_robot_state_and_warnings(&commands, &ctx, &start).unwrap());
    });

    group.bench_function("plate_fill_timeline", |b| {
        b.iter(|| simulate_timeline(&commands, &ctx, &start).unwrap());
    });

    group.bench_function("state_clone_and_fingerprint", |b| {
        let state = next_robot_state_and_warnings(&commands, &ctx, &start).unwrap().robot_state;
        b.iter_batched(|| state.clone(), |s| s.fingerprint().unwrap(), BatchSize::SmallInput);
    });

    group.finish();
}

criterion_group!(benches, bench_sequencer);
criterion_main!(benches);
