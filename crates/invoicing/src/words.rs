//! Amount in words for the legal "TOTAL VALUE (in words)" line.
//!
//! Short scale (thousand/million/billion), three-digit groups, most significant
//! first, upper-cased: `1500.50` → `ONE THOUSAND FIVE HUNDRED AND 50/100 ONLY`.

use exportdesk_core::Amount;

const ONES: [&str; 20] = [
    "", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten", "Eleven",
    "Twelve", "Thirteen", "Fourteen", "Fifteen", "Sixteen", "Seventeen", "Eighteen", "Nineteen",
];

const TENS: [&str; 10] = [
    "", "", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty", "Ninety",
];

const SCALES: [&str; 4] = ["", "Thousand", "Million", "Billion"];

/// Spell out an amount.
///
/// `Amount` is already rounded to cents and bounded below one trillion, so every
/// value has a spelling. Zero whole units read as "Zero" (`0.50` →
/// `ZERO AND 50/100 ONLY`).
pub fn amount_in_words(amount: Amount) -> String {
    let mut words = Vec::new();
    push_integer(amount.whole_units(), &mut words);
    if words.is_empty() {
        words.push("Zero");
    }

    let mut phrase = words.join(" ");
    let cents = amount.cents();
    if cents > 0 {
        phrase.push_str(&format!(" and {cents}/100"));
    }
    phrase.push_str(" Only");
    phrase.to_uppercase()
}

fn push_integer(value: u64, out: &mut Vec<&'static str>) {
    for (scale, scale_word) in SCALES.iter().enumerate().rev() {
        let group = (value / 1000u64.pow(scale as u32)) % 1000;
        if group == 0 {
            continue;
        }
        push_group(group as usize, out);
        if !scale_word.is_empty() {
            out.push(scale_word);
        }
    }
}

fn push_group(group: usize, out: &mut Vec<&'static str>) {
    let hundreds = group / 100;
    let rest = group % 100;
    let (tens, ones) = (rest / 10, rest % 10);

    if hundreds > 0 {
        out.push(ONES[hundreds]);
        out.push("Hundred");
    }

    if tens > 1 {
        out.push(TENS[tens]);
        if ones > 0 {
            out.push(ONES[ones]);
        }
    } else if rest > 0 {
        // 1..=19, teens included
        out.push(ONES[rest]);
    }
}
