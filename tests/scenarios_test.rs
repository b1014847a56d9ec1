//! End-to-end behaviour of triggers, search, formulas and sessions

use std::sync::Arc;

use cheevos_engine::core::EngineEvent;
use cheevos_engine::leaderboard::LeaderboardEvent;
use cheevos_engine::memory::SearchOutcome;
use cheevos_engine::triggers::{Cursor, OperandKind};
use cheevos_engine::{
    BankRegistry, Comparison, EngineConfig, EngineContext, MemSize, MemorySearchEngine, Operand,
    SearchSize, SharedMemory, Trigger, TriggerCategory, ValueFormula,
};
use parking_lot::Mutex;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn console_memory() -> (BankRegistry, SharedMemory) {
    init_logging();
    let memory = SharedMemory::new(0x10000);
    let mut banks = BankRegistry::new();
    banks.register(0, Box::new(memory.clone())).unwrap();
    (banks, memory)
}

#[test]
fn test_single_comparison() {
    let (banks, memory) = console_memory();
    let mut trigger = Trigger::parse("0xfe20=50", false).unwrap();

    memory.poke(0xfe20, 50);
    assert!(trigger.test(&banks));

    memory.poke(0xfe20, 49);
    assert!(!trigger.test(&banks));
}

#[test]
fn test_hit_count_needs_qualifying_frames_not_consecutive_ones() {
    let (banks, memory) = console_memory();
    let mut trigger = Trigger::parse("0xfe20>=10.3.", false).unwrap();

    let frames = [10u8, 5, 12, 3, 11];
    let mut results = Vec::new();
    for value in frames {
        memory.poke(0xfe20, value);
        results.push(trigger.test(&banks));
    }
    assert_eq!(results, vec![false, false, false, false, true]);
    assert_eq!(trigger.core().conditions()[0].current_hits, 3);
}

#[test]
fn test_reset_if_clears_hits() {
    let (banks, memory) = console_memory();
    let mut trigger = Trigger::parse("R:0xfe21=1_0xfe20=50.5.", false).unwrap();

    memory.poke(0xfe20, 50);
    trigger.test(&banks);
    trigger.test(&banks);
    assert_eq!(trigger.core().conditions()[1].current_hits, 2);

    memory.poke(0xfe21, 1);
    assert!(!trigger.test(&banks));
    assert_eq!(trigger.core().conditions()[1].current_hits, 0);
    assert!(trigger.lost_progress());
}

#[test]
fn test_reset_fails_only_its_own_group() {
    let (banks, memory) = console_memory();
    let mut trigger = Trigger::parse("R:0xHfe21=1_0xHfe20=50", false).unwrap();

    memory.poke(0xfe20, 50);
    memory.poke(0xfe21, 1);
    assert!(!trigger.test(&banks));

    memory.poke(0xfe21, 0);
    assert!(trigger.test(&banks));

    let mut with_alternate = Trigger::parse("0xHfe20=50SR:0xHfe21=1_0xHfe22=1", false).unwrap();
    memory.poke(0xfe21, 1);
    assert!(with_alternate.test(&banks));
    assert!(!with_alternate.has_hits());
}

#[test]
fn test_search_narrows_to_changed_bytes() {
    init_logging();
    let memory = SharedMemory::from_bytes(vec![5; 16]);
    let mut banks = BankRegistry::new();
    banks.register(0, Box::new(memory.clone())).unwrap();

    let mut search = MemorySearchEngine::new();
    search.reset(&banks, SearchSize::Byte);
    assert_eq!(search.len(), 16);

    let outcome = search.compare(&banks, Comparison::Equal, 5, false);
    assert_eq!(outcome, SearchOutcome { remaining: 16, found_any: true });

    for address in [0, 1, 2, 3, 8, 9, 10, 11] {
        memory.poke(address, 6);
    }
    let outcome = search.compare(&banks, Comparison::Equal, 5, false);
    assert_eq!(outcome, SearchOutcome { remaining: 8, found_any: true });
    let addresses: Vec<usize> = search.candidates().iter().map(|c| c.address).collect();
    assert_eq!(addresses, vec![4, 5, 6, 7, 12, 13, 14, 15]);
}

#[test]
fn test_search_never_grows_and_rolls_back_on_empty() {
    init_logging();
    let memory = SharedMemory::from_bytes((0..64).collect());
    let mut banks = BankRegistry::new();
    banks.register(0, Box::new(memory.clone())).unwrap();

    let mut search = MemorySearchEngine::new();
    search.reset(&banks, SearchSize::Byte);
    let mut previous = search.len();
    for (op, value) in [
        (Comparison::GreaterThan, 10),
        (Comparison::LessOrEqual, 40),
        (Comparison::NotEqual, 20),
        (Comparison::GreaterThan, 200),
    ] {
        let before = search.candidates().to_vec();
        let outcome = search.compare(&banks, op, value, false);
        assert!(outcome.remaining <= previous);
        if !outcome.found_any {
            assert_eq!(search.candidates(), before.as_slice());
        }
        previous = outcome.remaining;
    }
    assert_eq!(previous, 29);
}

#[test]
fn test_value_formula_weighted_sum() {
    let (banks, memory) = console_memory();
    memory.poke(0xfe24, 30);
    memory.poke(0xfe25, 2);

    let formula = ValueFormula::parse("0xfe24*1_0xfe25*60", false).unwrap();
    assert_eq!(formula.resolve(&banks), 150.0);
    assert_eq!(formula.resolve_u32(&banks), 150);
}

#[test]
fn test_round_trip_preserves_model() {
    let definitions = [
        "0xH0010=1",
        "0xfe20>=10.3.",
        "R:0xH00fe=1_0xL0010!=d0xL0010_P:0xM0001=1",
        "0xU0020<h1f(4)_0x 0030<=65535",
        "0xX1234>4294967295S0xH0001=2S0xT0002=0",
        "d0xH12345=0_0xH0000>=-1",
    ];
    for definition in definitions {
        let parsed = Trigger::parse(definition, false).unwrap();
        let text = parsed.serialize();
        let reparsed = Trigger::parse(&text, false).unwrap();
        assert_eq!(parsed.groups(), reparsed.groups(), "{definition} -> {text}");
        assert_eq!(reparsed.serialize(), text);
    }
}

#[test]
fn test_canonical_serialization() {
    let trigger = Trigger::parse("0xh10=h0a_R:d0X20==3(2)S0xM0001=1", false).unwrap();
    assert_eq!(trigger.serialize(), "0xH0010=10_R:d0x 0020=3.2.S0xM0001=1");
}

#[test]
fn test_hits_never_decrease_between_resets() {
    let (banks, memory) = console_memory();
    let mut trigger = Trigger::parse("0xH0001=1.100._0xH0002>0.100.", false).unwrap();

    let mut last = vec![0, 0];
    for frame in 0..40u8 {
        memory.poke(1, frame % 3);
        memory.poke(2, frame % 2);
        trigger.test(&banks);
        let hits: Vec<u32> = trigger.core().conditions().iter().map(|c| c.current_hits).collect();
        assert!(hits.iter().zip(&last).all(|(now, before)| now >= before));
        last = hits;
    }
    assert!(last[0] > 0 && last[1] > 0);
}

#[test]
fn test_pause_freezes_standard_and_reset_hits() {
    let (banks, memory) = console_memory();
    let mut trigger = Trigger::parse("P:0xH0010=1_R:0xH0011=1_0xH0012=1.10.", false).unwrap();

    memory.poke(0x12, 1);
    trigger.test(&banks);
    trigger.test(&banks);
    assert_eq!(trigger.core().conditions()[2].current_hits, 2);

    memory.poke(0x10, 1);
    memory.poke(0x11, 1);
    for _ in 0..3 {
        assert!(!trigger.test(&banks));
        assert_eq!(trigger.core().conditions()[1].current_hits, 0);
        assert_eq!(trigger.core().conditions()[2].current_hits, 2);
    }

    memory.poke(0x10, 0);
    trigger.test(&banks);
    assert_eq!(trigger.core().conditions()[2].current_hits, 0);
}

#[test]
fn test_delta_lags_one_pass() {
    let (banks, memory) = console_memory();
    let mut cursor = Cursor::new("d0xH0040", false);
    let mut delta = Operand::parse(&mut cursor).unwrap();
    assert_eq!(delta.kind, OperandKind::Delta);
    let mut live = Operand::address(0x40, MemSize::Byte);

    let mut previous_live = None;
    for value in [3u8, 7, 7, 1, 200] {
        memory.poke(0x40, value);
        let lagged = delta.resolve(&banks);
        if let Some(expected) = previous_live {
            assert_eq!(lagged, expected);
        }
        previous_live = Some(live.resolve(&banks));
    }
}

#[test]
fn test_alternate_groups_are_or_combined() {
    let (banks, memory) = console_memory();
    let mut trigger = Trigger::parse("0xH0001=1S0xH0002=1S0xH0003=1", false).unwrap();
    assert!(!trigger.test(&banks));

    memory.poke(3, 1);
    assert!(trigger.test(&banks));
}

#[test]
fn test_session_progress_survives_restart() {
    init_logging();
    let patch = r#"{"ID": 3, "Title": "Test", "Achievements": [
        {"ID": 1, "MemAddr": "0xH0001=1.10._0xH0002=1.10.", "Flags": 3},
        {"ID": 2, "MemAddr": "0xH0003=1.4.", "Flags": 3}
    ]}"#;
    let config = EngineConfig::default().with_username("scott");

    let memory = SharedMemory::new(0x100);
    let mut context = EngineContext::new(config.clone());
    context.register_bank(0, memory.clone()).unwrap();
    context.load_patch(patch).unwrap();

    memory.poke(1, 1);
    memory.poke(3, 1);
    for _ in 0..3 {
        context.advance_frame();
    }
    let saved = context.save_progress();

    let mut restarted = EngineContext::new(config);
    restarted.register_bank(0, memory.clone()).unwrap();
    restarted.load_patch(patch).unwrap();
    let report = restarted.load_progress(&saved).unwrap();
    assert_eq!(report.restored, vec![1, 2]);
    assert!(report.discarded.is_empty());

    let hits = |context: &EngineContext, id: u32| -> Vec<u32> {
        context
            .active_set()
            .find(id)
            .unwrap()
            .core()
            .conditions()
            .iter()
            .map(|c| c.current_hits)
            .collect()
    };
    assert_eq!(hits(&restarted, 1), vec![3, 0]);
    assert_eq!(hits(&restarted, 2), vec![3]);

    let report = restarted.advance_frame();
    assert_eq!(report.unlocked(), vec![2]);
}

#[test]
fn test_tampered_progress_is_discarded() {
    init_logging();
    let patch = r#"{"Achievements": [
        {"ID": 1, "MemAddr": "0xH0001=1.10.", "Flags": 3},
        {"ID": 2, "MemAddr": "0xH0002=1.10.", "Flags": 3}
    ]}"#;
    let memory = SharedMemory::new(0x10);
    let mut context = EngineContext::new(EngineConfig::default().with_username("scott"));
    context.register_bank(0, memory.clone()).unwrap();
    context.load_patch(patch).unwrap();

    memory.poke(1, 1);
    memory.poke(2, 1);
    context.advance_frame();
    context.advance_frame();
    let saved = context.save_progress();
    let tampered = saved.replacen("1:1:2:", "1:1:9:", 1);
    assert_ne!(saved, tampered);

    context.set_mut(TriggerCategory::Core).reset();
    let report = context.load_progress(&tampered).unwrap();
    assert_eq!(report.discarded, vec![1]);
    assert_eq!(report.restored, vec![2]);
    assert!(!context.active_set().find(1).unwrap().has_hits());
}

#[test]
fn test_leaderboard_attempt_lifecycle() {
    init_logging();
    let patch = r#"{"Leaderboards": [
        {"ID": 5, "Mem": "STA:0xH0010=1::CAN:0xH0011=1::SUB:0xH0012=1::VAL:0xH0020*1_0xH0021*60", "Format": "TIME", "Title": "Act 1"}
    ]}"#;
    let memory = SharedMemory::new(0x40);
    let mut context = EngineContext::default();
    context.register_bank(0, memory.clone()).unwrap();
    context.load_patch(patch).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    context.on_event(Box::new(move |event| {
        if let EngineEvent::Leaderboard(event) = event {
            sink.lock().push(event.clone());
        }
    }));

    memory.poke(0x10, 1);
    context.advance_frame();
    memory.poke(0x10, 0);
    memory.poke(0x11, 1);
    context.advance_frame();

    memory.poke(0x11, 0);
    memory.poke(0x10, 1);
    context.advance_frame();
    memory.poke(0x20, 30);
    memory.poke(0x21, 2);
    memory.poke(0x12, 1);
    context.advance_frame();

    let events = seen.lock().clone();
    assert_eq!(events.len(), 4);
    assert!(matches!(events[0], LeaderboardEvent::Started { id: 5, .. }));
    assert!(matches!(events[1], LeaderboardEvent::Cancelled { id: 5, .. }));
    assert!(matches!(events[2], LeaderboardEvent::Started { id: 5, .. }));
    assert_eq!(
        events[3],
        LeaderboardEvent::Submitted {
            id: 5,
            title: "Act 1".to_string(),
            value: 150,
            formatted: "00:02.50".to_string(),
        }
    );
}

#[test]
fn test_reset_event_when_progress_lost() {
    init_logging();
    let patch = r#"{"Achievements": [
        {"ID": 9, "MemAddr": "0xH0001=1.10._R:0xH0002=1", "Title": "Careful", "Flags": 3}
    ]}"#;
    let memory = SharedMemory::new(0x10);
    let mut config = EngineConfig::default();
    config.pause_on_reset = true;
    let mut context = EngineContext::new(config);
    context.register_bank(0, memory.clone()).unwrap();
    context.load_patch(patch).unwrap();

    memory.poke(1, 1);
    context.advance_frame();
    memory.poke(2, 1);
    let report = context.advance_frame();
    assert!(report
        .events
        .iter()
        .any(|e| matches!(e, EngineEvent::TriggerReset { id: 9, .. })));

    let report = context.advance_frame();
    assert!(!report
        .events
        .iter()
        .any(|e| matches!(e, EngineEvent::TriggerReset { .. })));
}

#[test]
fn test_lenient_and_strict_parsing() {
    init_logging();
    assert!(Trigger::parse("0xH0010=1garbage", false).is_err());
    let lenient = Trigger::parse("0xH0010=1garbage", true).unwrap();
    assert_eq!(lenient.core().len(), 1);

    let mut context = EngineContext::new(EngineConfig::default().with_lenient_parsing(false));
    let result = context.load_patch(r#"{"Achievements": [{"ID": 1, "MemAddr": "0xH0010~1", "Flags": 3}]}"#);
    assert!(result.is_err());
}
