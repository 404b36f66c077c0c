//! Voice pool invariants over random operation sequences.

use std::collections::HashSet;

use proptest::prelude::*;

use voicepool::{
    Clip, PlaybackParams, PoolConfig, VirtualChannelFactory, VoiceId, VoicePool,
};

#[derive(Debug, Clone)]
enum Op {
    Play { duration_ms: u32, looping: bool },
    PlayAbsent,
    Background,
    Reclaim(u32),
    Stop(u32),
    Tick { dt_ms: u32 },
    SetCapacity(usize),
    ClearAll,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (1u32..3_000, any::<bool>())
            .prop_map(|(duration_ms, looping)| Op::Play { duration_ms, looping }),
        1 => Just(Op::PlayAbsent),
        1 => Just(Op::Background),
        2 => (0u32..24).prop_map(Op::Reclaim),
        1 => (0u32..24).prop_map(Op::Stop),
        3 => (0u32..1_500).prop_map(|dt_ms| Op::Tick { dt_ms }),
        1 => (1usize..10).prop_map(Op::SetCapacity),
        1 => Just(Op::ClearAll),
    ]
}

fn check_invariants(pool: &VoicePool<VirtualChannelFactory>) {
    let active: HashSet<VoiceId> = pool.active_voices().map(|v| v.id()).collect();
    let available: HashSet<VoiceId> = pool.available_voices().map(|v| v.id()).collect();

    assert_eq!(active.len(), pool.active_count(), "duplicate active voice");
    assert_eq!(available.len(), pool.available_count(), "duplicate idle voice");
    assert!(active.is_disjoint(&available), "voice both active and idle");

    if let Some(music) = pool.music_voice() {
        assert!(!active.contains(&music.id()));
        assert!(!available.contains(&music.id()));
    }

    for voice in pool.active_voices() {
        assert!(voice.clip().is_some(), "active voice {} without clip", voice.id());
    }
    for voice in pool.available_voices() {
        assert!(voice.clip().is_none(), "idle voice {} still has a clip", voice.id());
    }
}

fn run(config: PoolConfig, ops: &[Op]) -> VoicePool<VirtualChannelFactory> {
    let mut pool = VoicePool::new(config, VirtualChannelFactory::new());
    let theme = Clip::new(1000, "theme", 60.0);

    for (i, op) in ops.iter().enumerate() {
        match *op {
            Op::Play { duration_ms, looping } => {
                let clip = Clip::new(i as u32, "sfx", duration_ms as f64 / 1000.0);
                let active_before = pool.active_count();
                match pool.play_sound(Some(&clip), PlaybackParams::new().looping(looping)) {
                    Ok(id) => assert!(pool.is_active(id)),
                    Err(_) => assert_eq!(pool.active_count(), active_before),
                }
            }
            Op::PlayAbsent => {
                let active_before = pool.active_count();
                let idle_before = pool.available_count();
                assert!(pool.play_sound(None, PlaybackParams::new()).is_err());
                assert_eq!(pool.active_count(), active_before);
                assert_eq!(pool.available_count(), idle_before);
            }
            Op::Background => {
                let music = pool.play_background_track(Some(&theme), 1.0).unwrap();
                assert!(pool.is_music(music));
            }
            Op::Reclaim(id) => {
                pool.reclaim(id);
            }
            Op::Stop(id) => {
                pool.stop(id);
            }
            Op::Tick { dt_ms } => {
                pool.tick(dt_ms as f64 / 1000.0);
            }
            Op::SetCapacity(capacity) => pool.set_capacity(capacity),
            Op::ClearAll => pool.clear_all(),
        }

        check_invariants(&pool);
    }

    pool
}

proptest! {
    #[test]
    fn sets_stay_disjoint_with_growth(ops in prop::collection::vec(op(), 1..80)) {
        run(PoolConfig::default(), &ops);
    }

    #[test]
    fn sets_stay_disjoint_without_growth(ops in prop::collection::vec(op(), 1..80)) {
        let pool = run(PoolConfig::default().with_auto_grow(false), &ops);
        let retained = pool.active_count() + pool.available_count();
        prop_assert!(pool.factory().created() - pool.factory().destroyed().len() >= retained);
    }

    #[test]
    fn without_growth_active_never_exceeds_capacity(
        capacity in 1usize..10,
        plays in 1usize..30,
    ) {
        let mut pool = VoicePool::new(
            PoolConfig::default().with_capacity(capacity).with_auto_grow(false),
            VirtualChannelFactory::new(),
        );
        let clip = Clip::new(0, "sfx", 1.0);

        let started = (0..plays)
            .filter(|_| pool.play_sound(Some(&clip), PlaybackParams::new()).is_ok())
            .count();

        prop_assert_eq!(started, plays.min(capacity));
        prop_assert_eq!(pool.active_count(), plays.min(capacity));
    }

    #[test]
    fn idle_stack_never_exceeds_capacity_after_reclaim(
        capacity in 1usize..10,
        plays in 1usize..30,
    ) {
        let mut pool = VoicePool::new(
            PoolConfig::default().with_capacity(capacity),
            VirtualChannelFactory::new(),
        );
        let clip = Clip::new(0, "sfx", 0.5);

        for _ in 0..plays {
            pool.play_sound(Some(&clip), PlaybackParams::new()).unwrap();
        }
        pool.tick(1.0);

        prop_assert_eq!(pool.active_count(), 0);
        prop_assert_eq!(pool.available_count(), plays.min(capacity));
        prop_assert_eq!(pool.factory().destroyed().len(), plays.saturating_sub(capacity));
    }
}
