//! Line-oriented terminal front end over the review services.

use std::io::{self, Write};
use std::time::Duration;

use backend::ReviewBackend;
use kanji_core::model::{ReviewCard, ReviewResult, SessionView};
use services::{
    AnswerOutcome, AppServices, ReviewSessionController, SessionError, SessionSnapshot,
    SubmissionReport,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

const SETTLE_POLL: Duration = Duration::from_millis(20);

/// Reads trimmed lines from stdin. `None` means end of input.
struct Input {
    lines: Lines<BufReader<Stdin>>,
}

impl Input {
    fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    async fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        print!("{label} > ");
        io::stdout().flush()?;
        Ok(self
            .lines
            .next_line()
            .await?
            .map(|line| line.trim().to_owned()))
    }
}

/// What a line of input asks for while a card is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReviewCommand {
    Flip,
    Answer(ReviewResult),
    End,
    Unknown,
}

fn parse_review_command(line: &str) -> ReviewCommand {
    match line {
        "" | "f" | "flip" => ReviewCommand::Flip,
        "q" | "quit" | "end" => ReviewCommand::End,
        "1" => ReviewCommand::Answer(ReviewResult::Again),
        "2" => ReviewCommand::Answer(ReviewResult::Good),
        "3" => ReviewCommand::Answer(ReviewResult::Easy),
        other => other
            .parse::<ReviewResult>()
            .map_or(ReviewCommand::Unknown, ReviewCommand::Answer),
    }
}

fn print_card(card: &ReviewCard, revealed: bool) {
    println!();
    println!("    {}", card.vocab);
    if !revealed {
        return;
    }
    if card.needs_furigana() {
        println!("    {}", card.furigana);
    }
    if !card.mean_en.is_empty() {
        println!("    en: {}", card.mean_en);
    }
    if !card.mean_vi.is_empty() {
        println!("    vi: {}", card.mean_vi);
    }
    for kanji in &card.kanjis {
        let readings = [kanji.onyomi.as_deref(), kanji.kunyomi.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" / ");
        let meaning = kanji
            .mean_en
            .as_deref()
            .or(kanji.mean_vi.as_deref())
            .unwrap_or("");
        println!("    {}  {readings}  {meaning}", kanji.character);
    }
}

fn render(snapshot: &SessionSnapshot) {
    match snapshot.view {
        SessionView::Stats => {
            println!();
            println!("{} words due for review.", snapshot.total_due_words);
            println!("[enter] choose session size  [r] refresh  [q] quit");
        }
        SessionView::Selection => {
            println!();
            println!(
                "Review {} of {} due words (1-{}).",
                snapshot.selected_word_count, snapshot.total_due_words, snapshot.max_selectable
            );
            println!("[number] change size  [enter] start  [c] cancel  [q] end");
        }
        SessionView::Review => {
            if let (Some(card), Some((position, count))) =
                (snapshot.current_card.as_ref(), snapshot.position())
            {
                println!();
                println!("Card {position}/{count}");
                print_card(card, snapshot.revealed);
            }
            println!("[enter] flip  [1] again  [2] good  [3] easy  [q] end session");
        }
        SessionView::Summary => {
            let stats = snapshot.stats;
            println!();
            println!("Session complete: {} words", stats.total);
            println!("  remembered:          {}", stats.remembered);
            println!("  somewhat remembered: {}", stats.somewhat_remembered);
            println!("  forgotten:           {}", stats.forgotten);
            if let Some(elapsed) = snapshot.elapsed() {
                println!("  time:                {}s", elapsed.num_seconds());
            }
            println!("[enter] new session  [q] quit");
        }
    }
}

fn report_submission(report: &SubmissionReport) {
    if report.is_failure() {
        println!("Could not save results; they were not submitted.");
    } else if report.submitted() > 0 {
        println!("Saved {} results.", report.submitted());
    }
}

fn report_error(err: &SessionError) {
    match err {
        SessionError::Empty => println!("Nothing is due right now."),
        other => println!("{other}"),
    }
}

async fn wait_until_settled(controller: &ReviewSessionController) {
    while controller.is_transitioning() {
        tokio::time::sleep(SETTLE_POLL).await;
    }
}

/// Handle one line of input. Returns `false` when the user is done.
async fn step(controller: &ReviewSessionController, view: SessionView, line: &str) -> bool {
    let result: Result<(), SessionError> = match (view, line) {
        (SessionView::Stats, "q" | "quit") | (SessionView::Summary, "q" | "quit") => {
            return false;
        }
        (SessionView::Stats, "r" | "refresh") => controller.refresh().await.map(|_| ()),
        (SessionView::Stats, _) => controller.begin_selection().map(|_| ()),

        (SessionView::Selection, "") => controller.start_review_session().await.map(|_| ()),
        (SessionView::Selection, "c" | "cancel") => controller.cancel().await.map(|_| ()),
        (SessionView::Selection, "q" | "quit") => controller.end_session().await.map(|_| ()),
        (SessionView::Selection, raw) => match raw.parse::<usize>() {
            Ok(size) => controller.set_selected_word_count(size).map(|_| ()),
            Err(_) => {
                let max = controller.snapshot().max_selectable;
                println!("Enter a number between 1 and {max}.");
                Ok(())
            }
        },

        (SessionView::Review, raw) => match parse_review_command(raw) {
            ReviewCommand::Flip => {
                controller.flip();
                Ok(())
            }
            ReviewCommand::Answer(result) => {
                match controller.record_outcome(result).await {
                    AnswerOutcome::Completed(report) => report_submission(&report),
                    AnswerOutcome::Advanced { .. } => wait_until_settled(controller).await,
                    AnswerOutcome::Ignored(reason) => {
                        tracing::debug!(?reason, "answer ignored");
                    }
                }
                Ok(())
            }
            ReviewCommand::End => controller.end_session().await.map(|report| {
                report_submission(&report);
            }),
            ReviewCommand::Unknown => {
                println!("Use 1/2/3 or again/good/easy.");
                Ok(())
            }
        },

        (SessionView::Summary, _) => controller.start_new_session().await.map(|_| ()),
    };

    if let Err(err) = result {
        report_error(&err);
    }
    true
}

/// Interactive review session driven from stdin.
pub async fn run_review(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let controller = services.controller();
    let mut input = Input::stdin();

    if let Err(err) = controller.initialize().await {
        report_error(&err);
    }

    loop {
        let snapshot = controller.snapshot();
        render(&snapshot);
        let Some(line) = input.prompt(&snapshot.view.to_string()).await? else {
            break;
        };
        if !step(&controller, snapshot.view, &line).await {
            break;
        }
    }

    // Leaving mid-session still saves what was answered.
    if controller.current_view() == SessionView::Review {
        let report = controller.end_session().await?;
        report_submission(&report);
    }
    Ok(())
}

/// Print the due list once.
pub async fn list_due(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let due = services.backend().fetch_due_reviews().await?;
    if due.is_empty() {
        println!("Nothing is due right now.");
        return Ok(());
    }
    for card in &due {
        if card.needs_furigana() {
            println!(
                "{:>8}  {} ({})  {}",
                card.vocab_id.value(),
                card.vocab,
                card.furigana,
                card.mean_en
            );
        } else {
            println!("{:>8}  {}  {}", card.vocab_id.value(), card.vocab, card.mean_en);
        }
    }
    println!("{} due", due.len());
    Ok(())
}

/// Browse due cards as loose flashcards. Answers go through the batch queue.
pub async fn run_flip(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let due = services.backend().fetch_due_reviews().await?;
    let queue = services.batch_queue();
    let mut input = Input::stdin();

    'cards: for card in &due {
        let mut revealed = false;
        loop {
            print_card(card, revealed);
            let Some(line) = input.prompt("flip").await? else {
                break 'cards;
            };
            match parse_review_command(&line) {
                ReviewCommand::Flip => revealed = !revealed,
                ReviewCommand::Answer(result) => {
                    queue.enqueue(card.vocab_id, result);
                    continue 'cards;
                }
                ReviewCommand::End => break 'cards,
                ReviewCommand::Unknown => println!("Use 1/2/3 or again/good/easy."),
            }
        }
    }

    report_submission(&queue.flush_now().await);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_and_words_map_to_results() {
        assert_eq!(
            parse_review_command("1"),
            ReviewCommand::Answer(ReviewResult::Again)
        );
        assert_eq!(
            parse_review_command("3"),
            ReviewCommand::Answer(ReviewResult::Easy)
        );
        assert_eq!(
            parse_review_command("Good"),
            ReviewCommand::Answer(ReviewResult::Good)
        );
    }

    #[test]
    fn blank_line_flips() {
        assert_eq!(parse_review_command(""), ReviewCommand::Flip);
        assert_eq!(parse_review_command("q"), ReviewCommand::End);
        assert_eq!(parse_review_command("4"), ReviewCommand::Unknown);
    }
}
