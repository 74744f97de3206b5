use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tunecast::error::AppError;
use tunecast::{PlayerEvent, PlayerHandle, PlayerSnapshot, SongId};

const HELP: &str = "commands: p (play/pause)  n (next)  b (back)  m (mode)  s <secs> (seek)  v <0..1> (volume)  rm <id> (remove)  l (list)  q (quit)";

#[derive(Debug, Clone, PartialEq)]
enum Action {
    TogglePlay,
    Next,
    Prev,
    Mode,
    Seek(f64),
    Volume(f32),
    Remove(SongId),
    List,
    Help,
    Quit,
}

fn parse_line(line: &str) -> Result<Action, String> {
    let mut parts = line.split_whitespace();
    let Some(cmd) = parts.next() else {
        return Err(String::new());
    };
    let arg = parts.next();
    let action = match (cmd, arg) {
        ("p", None) => Action::TogglePlay,
        ("n", None) => Action::Next,
        ("b", None) => Action::Prev,
        ("m", None) => Action::Mode,
        ("l", None) => Action::List,
        ("q", None) => Action::Quit,
        ("h" | "?", None) => Action::Help,
        ("s", Some(v)) => Action::Seek(v.parse().map_err(|_| format!("bad seconds: {v}"))?),
        ("v", Some(v)) => Action::Volume(v.parse().map_err(|_| format!("bad volume: {v}"))?),
        ("rm", Some(id)) => Action::Remove(SongId::new(id)),
        _ => return Err(format!("unknown command: {line}")),
    };
    Ok(action)
}

/// Fields worth a status line when they change.
#[derive(Debug, Default, PartialEq)]
struct Status {
    current: Option<SongId>,
    playing: bool,
    mode: &'static str,
    volume_pct: u32,
}

impl Status {
    fn of(s: &PlayerSnapshot) -> Self {
        Self {
            current: s.current_song.as_ref().map(|song| song.id.clone()),
            playing: s.is_playing,
            mode: s.mode.label(),
            volume_pct: (s.volume * 100.0).round() as u32,
        }
    }
}

fn print_status(s: &PlayerSnapshot) {
    let state = if s.is_playing { "playing" } else { "stopped/paused" };
    match &s.current_song {
        Some(song) => println!(
            "[{state}] {} ({}) {:.0}s/{:.0}s  mode={} vol={:.0}%",
            song.display_title(),
            song.id,
            s.current_time,
            song.duration_secs,
            s.mode.label(),
            s.volume * 100.0
        ),
        None => println!("[idle] mode={} vol={:.0}%", s.mode.label(), s.volume * 100.0),
    }
}

fn print_queue(s: &PlayerSnapshot) {
    let current = s.current_song.as_ref().map(|song| &song.id);
    for (i, song) in s.queue.iter().enumerate() {
        let marker = if Some(&song.id) == current { '>' } else { ' ' };
        println!("{marker} {i:>2}. {} [{}]", song.display_title(), song.id);
    }
}

/// Line-driven control loop on stdin. Returns once the player has shut down.
pub async fn run(
    handle: PlayerHandle,
    mut events: mpsc::Receiver<PlayerEvent>,
) -> Result<(), AppError> {
    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last = Status::default();
    let mut latest: Option<Box<PlayerSnapshot>> = None;
    let mut stdin_open = true;

    loop {
        tokio::select! {
            maybe_evt = events.recv() => {
                let Some(evt) = maybe_evt else {
                    break;
                };
                match evt {
                    PlayerEvent::State(snapshot) => {
                        let status = Status::of(&snapshot);
                        if status != last {
                            print_status(&snapshot);
                            last = status;
                        }
                        latest = Some(snapshot);
                    }
                    PlayerEvent::Notice(msg) => println!("! {msg}"),
                }
            }
            line = lines.next_line(), if stdin_open => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        stdin_open = false;
                        let _ = handle.shutdown().await;
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                };
                match parse_line(line.trim()) {
                    Ok(Action::TogglePlay) => handle.toggle_play().await?,
                    Ok(Action::Next) => handle.next_song().await?,
                    Ok(Action::Prev) => handle.prev_song().await?,
                    Ok(Action::Mode) => handle.toggle_mode().await?,
                    Ok(Action::Seek(secs)) => handle.seek(secs).await?,
                    Ok(Action::Volume(v)) => handle.change_volume(v).await?,
                    Ok(Action::Remove(id)) => handle.remove_from_queue(id).await?,
                    Ok(Action::List) => {
                        if let Some(s) = latest.as_deref() {
                            print_status(s);
                            print_queue(s);
                        }
                    }
                    Ok(Action::Help) => println!("{HELP}"),
                    Ok(Action::Quit) => {
                        let _ = handle.shutdown().await;
                    }
                    Err(e) if e.is_empty() => {}
                    Err(e) => println!("{e}\n{HELP}"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                let _ = handle.shutdown().await;
            }
        }
    }
    Ok(())
}
