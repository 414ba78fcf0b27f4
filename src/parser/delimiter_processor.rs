//! Pairing of inline delimiters into tokens.
//!
//! Inline grammars are grouped by priority and each group runs as one pass
//! over the phrasing content, highest group first. Tokens built by an earlier
//! pass are opaque to later passes: a delimiter never straddles one, but the
//! pass does descend into each token's `content` range. Inside a pass every
//! grammar of the group is scanned in lockstep and the earliest delimiter is
//! processed against a shared delimiter stack.

use std::mem;

use super::api::InlineContext;
use super::tokenizer::{Delimiter, DelimiterKind, InlineToken, InlineTokenizer, PairResult};

#[derive(Debug, Clone, Copy)]
struct StackEntry {
    /// Index of the producing grammar inside the group.
    grammar: usize,
    delimiter: Delimiter,
    /// Length of the accumulator when the delimiter was pushed.
    acc_index: usize,
    active: bool,
}

/// Run one priority group over `tokens` (the output of earlier groups) in
/// `[start, end)`.
pub fn process_group(
    group: &[&dyn InlineTokenizer],
    tokens: Vec<InlineToken>,
    start: usize,
    end: usize,
    ctx: &InlineContext<'_>,
) -> Vec<InlineToken> {
    let tokens = tokens
        .into_iter()
        .map(|mut token| {
            if let Some(range) = token.content.clone() {
                let children = mem::take(&mut token.children);
                let inner = ctx.nested(token.tokenizer);
                token.children = process_group(group, children, range.start, range.end, &inner);
            }
            token
        })
        .collect();

    GroupPass {
        group,
        ctx,
        stack: Vec::new(),
        acc: Vec::new(),
    }
    .run(tokens, start, end)
}

/// Fill every gap between tokens (at every depth) with the fallback grammar.
pub fn fill_text(
    fallback: &dyn InlineTokenizer,
    tokens: Vec<InlineToken>,
    start: usize,
    end: usize,
    ctx: &InlineContext<'_>,
) -> Vec<InlineToken> {
    let mut out = Vec::with_capacity(tokens.len() * 2 + 1);
    let mut cursor = start;
    for mut token in tokens {
        if token.start > cursor {
            out.extend(text_token(fallback, cursor, token.start, ctx));
        }
        if let Some(range) = token.content.clone() {
            let children = mem::take(&mut token.children);
            token.children = fill_text(fallback, children, range.start, range.end, ctx);
        }
        cursor = cursor.max(token.end);
        out.push(token);
    }
    if cursor < end {
        out.extend(text_token(fallback, cursor, end, ctx));
    }
    out
}

fn text_token(
    fallback: &dyn InlineTokenizer,
    start: usize,
    end: usize,
    ctx: &InlineContext<'_>,
) -> Option<InlineToken> {
    let delimiter = Delimiter::new(DelimiterKind::Full, start, end, '\0');
    fallback.process_full_delimiter(&delimiter, ctx)
}

struct GroupPass<'g, 'c> {
    group: &'g [&'g dyn InlineTokenizer],
    ctx: &'c InlineContext<'c>,
    stack: Vec<StackEntry>,
    /// Finished tokens in source order.
    acc: Vec<InlineToken>,
}

impl GroupPass<'_, '_> {
    fn run(mut self, existing: Vec<InlineToken>, start: usize, end: usize) -> Vec<InlineToken> {
        let mut cursor = start;
        for token in existing {
            self.scan_segment(cursor, token.start);
            cursor = token.end;
            self.acc.push(token);
        }
        self.scan_segment(cursor, end);

        let depth = self.stack.len();
        if depth > 0 {
            log::trace!("{} delimiters left unpaired", depth);
        }
        self.flush_singles(0);
        self.acc
    }

    /// Scan the gap `[start, end)` between opaque tokens.
    fn scan_segment(&mut self, start: usize, end: usize) {
        let mut cursor = start;
        // Last answer of each grammar; reused while it still lies ahead of the cursor.
        let mut cache: Vec<Option<Option<Delimiter>>> = vec![None; self.group.len()];

        while cursor < end {
            let mut best: Option<usize> = None;
            for (g, grammar) in self.group.iter().enumerate() {
                let stale = match cache[g] {
                    None => true,
                    Some(Some(d)) => d.start < cursor,
                    Some(None) => false,
                };
                if stale {
                    let found = grammar.find_delimiter(cursor, end, self.ctx);
                    if let Some(d) = found {
                        assert!(
                            d.start >= cursor && d.end > d.start && d.end <= end,
                            "grammar `{}` reported an invalid delimiter {}..{} in {}..{}",
                            grammar.name(),
                            d.start,
                            d.end,
                            cursor,
                            end
                        );
                    }
                    cache[g] = Some(found);
                }
                if let Some(Some(d)) = cache[g]
                    && best.is_none_or(|b| cache[b].flatten().is_some_and(|bd| d.start < bd.start))
                {
                    best = Some(g);
                }
            }

            let Some(first) = best else { break };
            let offset = cache[first].flatten().map_or(end, |d| d.start);
            let tied: Vec<(usize, Delimiter)> = cache
                .iter()
                .enumerate()
                .filter_map(|(g, c)| c.flatten().filter(|d| d.start == offset).map(|d| (g, d)))
                .collect();
            let (g, delimiter) = self.choose(&tied);

            cursor = delimiter.end;
            self.process(g, delimiter);
            if delimiter.kind == DelimiterKind::Full {
                continue;
            }
            // Losers that can still open stay on the stack; closer-only losers are dropped.
            for &(other, d) in &tied {
                if other != g && d.kind.can_open() {
                    cursor = cursor.max(d.end);
                    self.push_opener(other, d);
                }
            }
        }
    }

    /// Pick one of several delimiters starting at the same offset. A full
    /// delimiter wins outright; otherwise the closer whose opener sits
    /// deepest in the stack wins, then registration order. Only the winner
    /// gets to close.
    fn choose(&self, tied: &[(usize, Delimiter)]) -> (usize, Delimiter) {
        if let Some(&full) = tied.iter().find(|(_, d)| d.kind == DelimiterKind::Full) {
            return full;
        }
        let mut chosen = tied[0];
        let mut chosen_opener = None;
        for &(g, d) in tied {
            if !d.kind.can_close() {
                continue;
            }
            let Some(at) = self.top_opener(g, self.stack.len()) else {
                continue;
            };
            if chosen_opener.is_none_or(|best| at < best) {
                chosen = (g, d);
                chosen_opener = Some(at);
            }
        }
        chosen
    }

    fn process(&mut self, g: usize, delimiter: Delimiter) {
        let grammar = self.group[g];
        match delimiter.kind {
            DelimiterKind::Full => {
                if let Some(token) = grammar.process_full_delimiter(&delimiter, self.ctx) {
                    self.acc.push(token);
                }
            }
            DelimiterKind::Opener => self.push_opener(g, delimiter),
            DelimiterKind::Closer | DelimiterKind::Both => self.consume_closer(g, delimiter),
        }
    }

    fn push_opener(&mut self, grammar: usize, delimiter: Delimiter) {
        self.stack.push(StackEntry {
            grammar,
            delimiter,
            acc_index: self.acc.len(),
            active: true,
        });
    }

    /// Topmost usable opener of grammar `g` below stack index `below`.
    fn top_opener(&self, g: usize, below: usize) -> Option<usize> {
        self.stack[..below]
            .iter()
            .rposition(|e| e.grammar == g && e.active && e.delimiter.kind.can_open())
    }

    fn consume_closer(&mut self, g: usize, mut closer: Delimiter) {
        let grammar = self.group[g];
        let mut below = self.stack.len();
        let mut closer_usable = true;

        while closer_usable && let Some(i) = self.top_opener(g, below) {
            let opener = self.stack[i].delimiter;
            let inner = &self.acc[self.stack[i].acc_index..];
            match grammar.is_delimiter_pair(&opener, &closer, inner, self.ctx) {
                PairResult::Paired => {
                    self.flush_singles(i + 1);
                    let inner = self.acc.split_off(self.stack[i].acc_index);
                    let outcome = grammar.process_delimiter_pair(&opener, &closer, inner, self.ctx);
                    self.acc.extend(outcome.tokens);

                    match outcome.remaining_opener {
                        Some(rest) => self.stack[i].delimiter = rest,
                        None => {
                            self.stack.truncate(i);
                        }
                    }
                    match outcome.remaining_closer {
                        Some(rest) => {
                            closer = rest;
                            below = self.stack.len();
                        }
                        None => return,
                    }
                }
                PairResult::Unpaired {
                    opener: opener_ok,
                    closer: closer_ok,
                } => {
                    if !opener_ok {
                        self.stack[i].active = false;
                    }
                    closer_usable = closer_ok;
                    below = i;
                }
            }
        }

        if closer.kind.can_open() {
            self.push_opener(g, closer);
        } else {
            let tokens = grammar.process_single_delimiter(&closer, self.ctx);
            self.acc.extend(tokens);
        }
    }

    /// Pop every entry from `from` up and replace each with whatever its
    /// grammar makes of it alone.
    fn flush_singles(&mut self, from: usize) {
        while self.stack.len() > from {
            let Some(entry) = self.stack.pop() else { break };
            let grammar = self.group[entry.grammar];
            let tokens = grammar.process_single_delimiter(&entry.delimiter, self.ctx);
            let at = entry.acc_index.min(self.acc.len());
            self.acc.splice(at..at, tokens);
        }
    }
}
