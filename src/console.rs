use std::io::{BufRead, Write};

use tracing::{debug, info, warn};

use crate::input::{parse_swipe, parse_token, GestureTranslator};
use crate::models::{AttendanceMark, Student};
use crate::session::{AttendanceSession, Direction, Screen, SubmitReceipt};
use crate::submission::SubmissionService;

const MARKING_HELP: &str =
    "enter/p present, shift/a absent, up/k, down/j, esc/f finish early, wheel <dy>, swipe <from> <to>, quit";
const REVIEW_HELP: &str = "set <roll> p|a, del <roll>, back, submit [remark], quit";
const SELECT_HELP: &str = "<position> or <group> <from> to start, blank line or quit to finish";

/// Runs marking sessions back to back until the operator quits or input ends.
/// Starts from the selecting prompt unless the session was already started.
pub async fn run_take<R: BufRead, W: Write>(
    session: &mut AttendanceSession<'_>,
    service: &SubmissionService<'_>,
    input: &mut R,
    out: &mut W,
) -> anyhow::Result<Vec<SubmitReceipt>> {
    let mut receipts = Vec::new();
    loop {
        if session.screen() == Screen::Selecting {
            writeln!(out)?;
            write!(out, "Start at ({SELECT_HELP}): ")?;
            out.flush()?;
            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                break;
            }
            let line = line.trim();
            if line.is_empty() || line == "quit" {
                break;
            }
            match select_start(session, line) {
                Ok(position) => {
                    if let Err(err) = session.start(position) {
                        writeln!(out, "{err}")?;
                        continue;
                    }
                    info!(position, "attendance session opened");
                }
                Err(message) => {
                    writeln!(out, "{message}")?;
                    continue;
                }
            }
        }

        match run_session(session, service, &mut *input, out).await? {
            Some(receipt) => receipts.push(receipt),
            None => break,
        }
    }
    Ok(receipts)
}

fn select_start(session: &AttendanceSession<'_>, line: &str) -> Result<usize, String> {
    let args: Vec<&str> = line.split_whitespace().collect();
    match args.as_slice() {
        [position] => position
            .parse::<usize>()
            .map_err(|_| format!("{position} is not a roster position")),
        [group, from] => {
            let from = from
                .parse::<usize>()
                .map_err(|_| format!("{from} is not a position within {group}"))?;
            session
                .roster()
                .start_position(group, from)
                .map_err(|err| err.to_string())
        }
        _ => Err(SELECT_HELP.to_string()),
    }
}

/// Drives one marking session from line-based terminal input. Returns the
/// receipt once attendance is submitted, or `None` if the operator quits.
pub async fn run_session<R: BufRead, W: Write>(
    session: &mut AttendanceSession<'_>,
    service: &SubmissionService<'_>,
    input: &mut R,
    out: &mut W,
) -> anyhow::Result<Option<SubmitReceipt>> {
    let mut gestures = GestureTranslator::new();
    let mut lines = input.lines();

    loop {
        match session.screen() {
            Screen::Marking => render_marking(session, out)?,
            Screen::Reviewing => render_review(session, out)?,
            Screen::Selecting => return Ok(None),
        }

        let Some(line) = lines.next() else {
            warn!(marked = session.marks().len(), "input closed before submission");
            return Ok(None);
        };
        let line = line?;
        let line = line.trim();
        if line == "quit" {
            return Ok(None);
        }

        if session.screen() == Screen::Marking {
            let raw = match parse_swipe(line) {
                Some(sequence) => sequence.to_vec(),
                None => parse_token(line).into_iter().collect(),
            };
            if raw.is_empty() {
                writeln!(out, "{MARKING_HELP}")?;
                continue;
            }
            for event in raw.into_iter().filter_map(|r| gestures.translate(r)) {
                if !session.apply(event) {
                    debug!(?event, "event ignored");
                }
            }
            continue;
        }

        let mut parts = line.splitn(2, ' ');
        let command = parts.next().unwrap_or_default();
        let rest = parts.next().unwrap_or_default().trim();
        match command {
            "set" => {
                let mut args = rest.split_whitespace();
                let (Some(id), Some(mark)) = (args.next(), args.next()) else {
                    writeln!(out, "{REVIEW_HELP}")?;
                    continue;
                };
                match (session.roster().find(id), mark.parse::<AttendanceMark>()) {
                    (Some(student), Ok(mark)) => {
                        let id = student.id.clone();
                        session.update_status(&id, mark);
                    }
                    (None, _) => writeln!(out, "unknown roll number {id}")?,
                    (_, Err(err)) => writeln!(out, "{err}")?,
                }
            }
            "del" => {
                if !session.delete_record(rest) {
                    writeln!(out, "{rest} has no mark")?;
                }
            }
            "back" => {
                session.back();
            }
            "submit" => match session.submit(rest, service).await {
                Ok(receipt) => {
                    writeln!(
                        out,
                        "Attendance submitted: {} present, {} absent",
                        receipt.tally.present, receipt.tally.absent
                    )?;
                    return Ok(Some(receipt));
                }
                Err(err) => writeln!(out, "Failed to submit attendance: {err}")?,
            },
            _ => writeln!(out, "{REVIEW_HELP}")?,
        }
    }
}

fn render_marking<W: Write>(session: &AttendanceSession<'_>, out: &mut W) -> std::io::Result<()> {
    let Some(current) = session.current() else {
        return Ok(());
    };
    writeln!(out)?;
    let arrow = match session.direction() {
        Direction::Down => 'v',
        Direction::Up => '^',
    };
    writeln!(out, "[{} / {}] {arrow}", session.position(), session.roster().len())?;
    if let Some(previous) = session.previous() {
        writeln!(out, "    {}", describe(session, previous))?;
    }
    writeln!(out, " >  {}", describe(session, current))?;
    if let Some(next) = session.next() {
        writeln!(out, "    {}", describe(session, next))?;
    }
    Ok(())
}

fn render_review<W: Write>(session: &AttendanceSession<'_>, out: &mut W) -> std::io::Result<()> {
    let tally = session.marks().tally();
    writeln!(out)?;
    writeln!(out, "Review: {} present, {} absent", tally.present, tally.absent)?;
    for (student, mark) in session.reviewed_students() {
        let badge = match mark {
            AttendanceMark::Present => 'P',
            AttendanceMark::Absent => 'A',
        };
        writeln!(out, "  {:<12} {:<30} {}", student.id, student.name, badge)?;
    }
    Ok(())
}

fn describe(session: &AttendanceSession<'_>, student: &Student) -> String {
    match session.marks().get(&student.id) {
        Some(mark) => format!("{} {} ({})", student.id, student.name, mark.label()),
        None => format!("{} {}", student.id, student.name),
    }
}
