//! ## Printing Module
//!
//! This module is only here to make logging in the terminal easier to read.
//! It prints in appropriate colors depending on the situation, and provides a table format
//! for the [WorldView].
//!
//! Every level can be switched off at runtime through the toggles in [config].
use ansi_term::Colour::{self, Green, Purple, Red, Yellow};
use prettytable::{format, row, Cell, Row, Table};
use std::sync::Mutex;
use unicode_width::UnicodeWidthStr;

use crate::config;
use crate::world_view::{ButtonMatrix, CarState, Heading, MotionState, OrderStatus, WorldView};


/// A poisoned toggle still prints
fn enabled(flag: &Mutex<bool>) -> bool {
    flag.lock().map(|on| *on).unwrap_or(true)
}

/// Prints an error message in red to the terminal.
///
/// If `PRINT_ERR_ON` is `false`, the message will not be printed.
///
/// ## Terminal output
/// - "\[ERROR\]:   {}", msg
///
/// ## Example
/// ```
/// use elevfleet::print;
///
/// print::err("Something went wrong!".to_string());
/// ```
pub fn err(msg: String) {
    if enabled(&config::PRINT_ERR_ON) {
        println!("{}{}\n", Red.paint("[ERROR]:   "), Red.paint(msg));
    }
}

/// Prints a warning message in yellow to the terminal.
///
/// If `PRINT_WARN_ON` is `false`, the message will not be printed.
///
/// ## Terminal output
/// - "\[WARNING\]: {}", msg
pub fn warn(msg: String) {
    if enabled(&config::PRINT_WARN_ON) {
        println!("{}{}\n", Yellow.paint("[WARNING]: "), Yellow.paint(msg));
    }
}

/// Prints a success message in green to the terminal.
///
/// If `PRINT_OK_ON` is `false`, the message will not be printed.
///
/// ## Terminal output
/// - "\[OK\]:      {}", msg
pub fn ok(msg: String) {
    if enabled(&config::PRINT_OK_ON) {
        println!("{}{}\n", Green.paint("[OK]:      "), Green.paint(msg));
    }
}

/// Prints an informational message in light blue to the terminal.
///
/// If `PRINT_INFO_ON` is `false`, the message will not be printed.
///
/// ## Terminal output
/// - "\[INFO\]:    {}", msg
pub fn info(msg: String) {
    let light_blue = Colour::RGB(102, 178, 255);
    if enabled(&config::PRINT_INFO_ON) {
        println!("{}{}\n", light_blue.paint("[INFO]:    "), light_blue.paint(msg));
    }
}

/// Prints a message for something that should never happen to a healthy car,
/// with the message in a rainbow of colors.
///
/// Always printed, regardless of the toggles.
pub fn cosmic_err(fun: String) {
    print!("{}", Colour::Red.paint("[ERROR]:   "));

    let colors = [
        Colour::Red,
        Colour::Yellow,
        Colour::Green,
        Colour::Cyan,
        Colour::Blue,
        Colour::Purple,
    ];

    let message = format!("Something impossible happened! IN: {}", fun);
    for (i, c) in message.chars().enumerate() {
        let color = colors[i % colors.len()];
        print!("{}", color.paint(c.to_string()));
    }
    println!("\n");
}

/// Pads the input text to a fixed display width using spaces.
///
/// Accounts for characters that take more than one column.
fn pad_text(text: &str, width: usize) -> String {
    let visible_width = UnicodeWidthStr::width(text);
    let padding = width.saturating_sub(visible_width);
    format!("{}{}", text, " ".repeat(padding))
}

fn banner(title: &str) -> String {
    let inner = 32;
    let line = "─".repeat(inner);
    format!("┌{}┐\n│  {}│\n└{}┘", line, pad_text(title, inner - 2), line)
}

fn motion_cell(car: &CarState) -> Cell {
    let arrow = match car.elevator.heading {
        Heading::Up => "↑",
        Heading::Down => "↓",
    };
    match car.elevator.motion {
        MotionState::Idle => Cell::new("Idle").style_spec("Fg"),
        MotionState::Moving => Cell::new(&format!("{} Moving", arrow)).style_spec("Fy"),
        MotionState::DoorOpen => Cell::new("Door open").style_spec("Fm"),
        MotionState::Undefined => Cell::new("Undefined").style_spec("Fr"),
    }
}

/// One line per floor, top floor first: `floor  up down cab`
fn matrix_lines<T: Copy>(matrix: &ButtonMatrix<T>, symbol: impl Fn(T) -> char) -> String {
    (0..config::NUM_FLOORS)
        .rev()
        .map(|floor| {
            let symbols: Vec<String> = matrix.iter().map(|row| symbol(row[floor]).to_string()).collect();
            format!("{:<2} {}", floor, symbols.join(" "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn status_symbol(status: OrderStatus) -> char {
    match status {
        OrderStatus::None => '·',
        OrderStatus::Requested => 'R',
        OrderStatus::Completing => 'C',
    }
}

/// Builds the table printed by [worldview]. Unused slots are left out.
pub fn worldview_table(wv: &WorldView) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);
    table.set_titles(row!["Slot", "Identity", "Online", "Motion", "Floor", "Queue\n   ↑ ↓ c", "Status\n   ↑ ↓ c"]);

    for (slot, car) in wv.cars.iter().enumerate().filter(|(_, car)| !car.is_unused()) {
        let online = if slot == 0 {
            Cell::new("me").style_spec("Fc")
        } else if car.online {
            Cell::new("yes").style_spec("Fg")
        } else {
            Cell::new("no").style_spec("Fr")
        };
        table.add_row(Row::new(vec![
            Cell::new(&slot.to_string()),
            Cell::new(&car.identity),
            online,
            motion_cell(car),
            Cell::new(&car.elevator.floor.to_string()),
            Cell::new(&matrix_lines(&car.elevator.local_queue, |on| if on { '●' } else { '·' })),
            Cell::new(&matrix_lines(&car.order_status, status_symbol)),
        ]));
    }
    table
}

/// Logs the `WorldView` to the terminal in a table.
///
/// If `PRINT_WV_ON` is `false`, nothing is printed.
pub fn worldview(wv: &WorldView) {
    if !enabled(&config::PRINT_WV_ON) {
        return;
    }
    println!("{}", Purple.bold().paint(banner("WORLD VIEW")));
    print!("{}", worldview_table(wv));
    println!();
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_text_counts_display_width() {
        assert_eq!(pad_text("ab", 4), "ab  ");
        assert_eq!(pad_text("↑", 3), "↑  ");
        assert_eq!(pad_text("toolong", 3), "toolong");
    }

    #[test]
    fn table_lists_claimed_slots_only() {
        let mut wv = WorldView::new("peer-a");
        wv.cars[2] = CarState::new("peer-c");
        let table = worldview_table(&wv);
        assert_eq!(table.len(), 2);
        let rendered = table.to_string();
        assert!(rendered.contains("peer-a"));
        assert!(rendered.contains("peer-c"));
    }

    #[test]
    fn matrix_lines_put_top_floor_first() {
        let mut status = crate::world_view::EMPTY_ORDER_STATUS;
        status[0][config::NUM_FLOORS - 1] = OrderStatus::Requested;
        let lines = matrix_lines(&status, status_symbol);
        assert!(lines.lines().next().unwrap_or_default().contains('R'));
    }
}
