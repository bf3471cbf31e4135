use std::fmt::Write as _;

use twenty48_core::engine::{AnimationKind, GameEngine};

/// Score header, grid and end-of-game banner.
pub fn render(game: &GameEngine) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "score {:>8}   best {:>8}   moves {}",
        game.score(),
        game.high_score(),
        game.moves()
    );
    out.push_str(&game.grid().to_string());
    if let Some(banner) = banner(game) {
        out.push_str(banner);
        out.push('\n');
    }
    out
}

/// Status line for finished or endless games.
pub fn banner(game: &GameEngine) -> Option<&'static str> {
    if game.game_won() {
        if game.can_continue() {
            Some("You win! 'c' keeps going, 'n' starts over.")
        } else {
            Some("You win! Endless run complete, 'n' starts over.")
        }
    } else if game.game_lost() {
        Some("Game over. 'u' undoes the last move, 'n' starts over.")
    } else if !game.can_continue() {
        Some("Endless mode")
    } else {
        None
    }
}

/// Opacity of the end-of-game overlay: follows the fade record while it
/// runs, fully opaque otherwise.
pub fn overlay_alpha(game: &GameEngine) -> f64 {
    game.timeline()
        .global_animations()
        .iter()
        .filter(|r| r.kind == AnimationKind::FadeGlobal)
        .map(|r| r.percentage_done())
        .last()
        .unwrap_or(1.0)
}

/// Tick the animation clock in `frame_ns` steps until nothing is running or
/// `max_frames` is hit. `on_frame` sees the engine after every tick.
pub fn settle_animations(
    game: &mut GameEngine,
    frame_ns: u64,
    max_frames: u32,
    mut on_frame: impl FnMut(&GameEngine),
) -> u32 {
    let mut frames = 0;
    while game.is_animation_active() && frames < max_frames {
        game.tick(frame_ns);
        frames += 1;
        on_frame(game);
    }
    frames
}
