/*!
PLIK compiles a named regular-expression alphabet and a context-free
grammar into a working LL(1) parser, then decides whether an input text is
accepted. The lexical side compiles the alphabet through Thompson
construction, subset construction and DFA minimization into a
longest-match tokenizer; the syntactic side computes FIRST and FOLLOW
sets, builds the predictive table (rejecting non-LL(1) grammars at that
point) and drives a stack machine over the token stream.

# Usage

```text
plik <grammar file> <regex file> <input file | "input string"> [-v|-V]
```

If the third argument names an existing file its contents are parsed,
otherwise the argument itself is. The last line printed on a clean run is
`Accepted string? true` or `Accepted string? false`; with `-v`/`-V` the
parser also prints one line per step showing its stack, the remaining
input and the action taken.

The same pipeline is available as a library:

```no_run
use std::path::Path;

let verdict = plik::driver::run(
    Path::new("expr.g"),
    Path::new("expr.rx"),
    "a+b*c",
    false,
).unwrap();
assert!(verdict.is_accepted());
```

# Regex file syntax

One rule per non-blank line, `//` lines are comments:

```text
NUM : \d.\d*
PLUS : \+
WS : ( )+
```

The name left of `:` tags the tokens the rule matches; declaration order
breaks ties when two rules match the same longest lexeme. Expressions use
postfix `*` (zero or more), `+` (one or more) and `?` (optional), explicit
`.` for concatenation, `|` for alternation and parentheses for grouping.
Any other character matches itself; `\` escapes the operators, `\d` is a
decimal digit and `\w` a lowercase letter. Tokens matched by a rule named
`WS` are discarded before parsing.

# Grammar file syntax

One rule per non-blank line: a left-hand side, `->`, and one or more
whitespace-separated alternatives split by `|`. The marker `#` denotes the
empty production and must stand alone. The first left-hand side is the
start symbol.

```text
E -> T E'
E' -> + T E' | #
T -> F T'
T' -> * F T' | #
F -> ( E ) | id
```

A token stands for the grammar terminal equal to its tag if one is
declared, otherwise for the terminal equal to its lexeme, so punctuation
can be written literally in the grammar while regex rules keep identifier
names.
*/

pub mod analysis;
pub mod dfa;
pub mod driver;
mod error;
pub mod grammar;
pub mod lexer;
pub mod ll1;
pub mod nfa;
pub mod regex_parser;

pub use error::Error;
pub use ll1::Verdict;
