//! Line-oriented terminal driver for the quiz loop.

use std::io::Write;

use quiz_core::leveling::reward_for_level;
use quiz_core::model::{OptionKey, Question, QuestionBank};
use services::{
    AnswerFeedback, AppServices, Clock, FeedbackSink, QuizSession, SessionEnd, SessionStep,
    Termination,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Rings the terminal bell on misses and at game over; everything else is logged.
pub struct TerminalBell;

impl TerminalBell {
    fn ring() {
        ring_to(&mut std::io::stdout());
    }
}

fn ring_to(out: &mut impl Write) {
    if let Err(err) = out.write_all(b"\x07").and_then(|()| out.flush()) {
        tracing::debug!(error = %err, "terminal bell failed");
    }
}

impl FeedbackSink for TerminalBell {
    fn click(&self) {
        tracing::trace!("cue: click");
    }

    fn success(&self) {
        tracing::trace!("cue: success");
    }

    fn failure(&self) {
        Self::ring();
    }

    fn game_over(&self) {
        Self::ring();
    }

    fn level_complete(&self) {
        tracing::trace!("cue: level complete");
    }

    fn level_up(&self, new_level: u32) {
        tracing::trace!(new_level, "cue: level up");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Answer(OptionKey),
    Skip,
    Bookmark,
    Sound,
    Quit,
    Abandon,
}

fn parse_input(line: &str) -> Option<Input> {
    match line.trim() {
        "s" | "skip" => Some(Input::Skip),
        "*" | "bookmark" => Some(Input::Bookmark),
        "m" | "mute" => Some(Input::Sound),
        "q" | "quit" => Some(Input::Quit),
        "x" | "abandon" => Some(Input::Abandon),
        other => other
            .to_ascii_uppercase()
            .parse::<OptionKey>()
            .ok()
            .map(Input::Answer),
    }
}

struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    async fn read(&mut self, text: &str) -> std::io::Result<Option<String>> {
        print!("{text}");
        std::io::stdout().flush()?;
        self.lines.next_line().await
    }
}

/// Run one interactive session over `bank`.
///
/// # Errors
///
/// Returns session, storage or terminal I/O errors.
pub async fn play(
    services: &AppServices,
    bank: &QuestionBank,
    clock: Clock,
) -> Result<(), Box<dyn std::error::Error>> {
    let loop_svc = services.session_loop();
    let bookmarks = services.bookmarks();
    let mut session = loop_svc.start_session(bank.questions()).await?;
    let mut prompt = Prompt::stdin();

    while let Some(question) = session.current_question().cloned() {
        print_question(&session, &question, clock);

        let selected = loop {
            let Some(line) = prompt.read("> ").await? else {
                loop_svc.abandon(&mut session);
                return Ok(());
            };
            match parse_input(&line) {
                Some(Input::Answer(key)) => break Some(key),
                Some(Input::Skip) => break None,
                Some(Input::Bookmark) => {
                    let on = bookmarks.toggle(&question).await?;
                    println!("{}", if on { "Bookmarked." } else { "Bookmark removed." });
                }
                Some(Input::Sound) => {
                    let on = loop_svc.toggle_sound(&mut session);
                    println!("Sound {}.", if on { "on" } else { "off" });
                }
                Some(Input::Quit) => {
                    let end = loop_svc.end_session(&mut session).await?;
                    print_end(&end);
                    return Ok(());
                }
                Some(Input::Abandon) => {
                    loop_svc.abandon(&mut session);
                    println!("Session discarded.");
                    return Ok(());
                }
                None => println!("Enter A-D, s (skip), * (bookmark), m (mute), q (quit), x (abandon)."),
            }
        };

        let feedback = match loop_svc.expire_if_due(&mut session).await? {
            Some(timed_out) => {
                println!("Time is up.");
                timed_out
            }
            None => loop_svc.answer_current(&mut session, selected).await?,
        };
        print_feedback(&feedback);

        if let SessionStep::Ended(end) = loop_svc.next(&mut session).await? {
            print_end(&end);
            return Ok(());
        }
    }

    Ok(())
}

fn print_question(session: &QuizSession, question: &Question, clock: Clock) {
    let progress = session.progress();
    println!();
    println!(
        "Question {}/{}  lives {}  streak {}  score {}",
        progress.position + 1,
        progress.total,
        progress.lives,
        progress.streak,
        progress.score
    );
    if let Some(left) = session.time_left(clock.now()) {
        println!("{}s to answer", left.num_seconds());
    }
    println!("[{}] {}", question.category(), question.prompt());
    for (key, text) in question.options() {
        println!("  {key}) {text}");
    }
}

fn print_feedback(feedback: &AnswerFeedback) {
    let record = &feedback.record;
    if record.correct {
        println!("Correct! +{} points", record.points);
    } else {
        println!(
            "Wrong. The answer was {}. Lives left: {}",
            record.question.correct(),
            feedback.lives_left
        );
    }
    println!("{}", record.question.explanation());
}

fn print_end(end: &SessionEnd) {
    let outcome = &end.outcome;
    let score = &outcome.score;
    println!();
    match outcome.termination {
        Termination::ExhaustedLives => println!(
            "Game over! You ran out of lives after {} questions.",
            score.answered_count()
        ),
        Termination::CompletedAll if outcome.is_perfect() => {
            println!("Perfect run! Every question answered correctly.");
        }
        Termination::CompletedAll => println!("You completed every question."),
        Termination::PartialStop => println!("Session stopped."),
    }
    println!(
        "Score {}  accuracy {}%  time {}s  best streak {}",
        score.total_score(),
        score.accuracy_percent(),
        score.elapsed_secs(),
        outcome.best_streak
    );

    let info = &end.award.info;
    println!(
        "+{} XP  level {} ({}/{} XP, {:.0}%)",
        end.award.xp_gained,
        info.level,
        info.xp_into_level,
        info.xp_for_next_level,
        info.progress_percentage
    );
    if let Some(up) = &end.award.level_up {
        match up.reward {
            Some(reward) => println!("Level up! Level {} unlocked: {reward}", up.new_level),
            None => println!("Level up! Level {}", up.new_level),
        }
    }

    let missed: Vec<_> = outcome.mistakes().collect();
    if !missed.is_empty() {
        println!("Review:");
        for record in missed {
            println!(
                "  {} -> {}",
                record.question.prompt(),
                record.question.correct()
            );
        }
    }
}

/// Print the score board, lifetime totals and level progress.
///
/// # Errors
///
/// Returns storage errors.
pub async fn print_stats(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let stats = services.lifetime_stats().await?;
    let xp = services.xp();
    let info = xp.current().await?;
    let milestone = xp.next_milestone().await?;

    println!(
        "Level {}  total XP {}  ({:.0}% to next level)",
        info.level, info.total_xp, info.progress_percentage
    );
    match reward_for_level(milestone.level) {
        Some(reward) => println!(
            "Next milestone: level {} ({reward}), {} XP to go",
            milestone.level, milestone.xp_needed
        ),
        None => println!(
            "Next milestone: level {}, {} XP to go",
            milestone.level, milestone.xp_needed
        ),
    }
    println!(
        "Sessions on the board {}  points {}  best {}",
        stats.sessions_recorded,
        stats.total_points,
        stats.best_score.map_or_else(|| "-".to_string(), |s| s.to_string())
    );

    for (rank, score) in services.progress().scores().await?.iter().enumerate() {
        println!(
            "{:>2}. {:>5}  {:>3}%  {}/{}  {}",
            rank + 1,
            score.total_score(),
            score.accuracy_percent(),
            score.correct_count(),
            score.answered_count(),
            score.recorded_at().format("%Y-%m-%d %H:%M")
        );
    }
    println!("Bookmarks: {}", services.bookmarks().count().await?);
    Ok(())
}

/// Print bookmarks grouped by category.
///
/// # Errors
///
/// Returns storage errors.
pub async fn print_bookmarks(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let groups = services.bookmarks().list_by_category().await?;
    if groups.is_empty() {
        println!("No bookmarks yet.");
    }
    for group in groups {
        println!("{} ({})", group.category, group.bookmarks.len());
        for bookmark in &group.bookmarks {
            let q = &bookmark.question;
            println!("  #{} {}", q.id(), q.prompt());
            println!(
                "     answer {}: {}",
                q.correct(),
                q.option(q.correct()).unwrap_or_default()
            );
        }
    }
    Ok(())
}
