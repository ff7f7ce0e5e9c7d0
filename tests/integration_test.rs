//! Integration tests for rbeautify
//!
//! These tests verify that the grammar, the indenter and the pipeline work
//! together correctly

#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::io::{BufReader, Cursor};

use rbeautify::grammar::GRAMMAR;
use rbeautify::parser::ParserState;
use rbeautify::process::{changed_lines, format_file, reindent};
use rbeautify::{classify, effective_config, find_directive, Config, Indenter, LineShape};

fn run(input: &str) -> String {
    reindent(input, &Config::default())
        .unwrap_or_else(|e| panic!("reindent failed: {e}\n{}", e.caret()))
}

fn with_unit(unit: &str) -> Config {
    Config {
        indent_unit: unit.to_string(),
        ..Default::default()
    }
}

// ============================================================================
// Block structure
// ============================================================================

#[test]
fn test_class_with_if_else() {
    let input = "class Test\nif something > 0\nblah\nelse\nblah\nend\nend\n";
    let expected =
        "class Test\n  if something > 0\n    blah\n  else\n    blah\n  end\nend\n";
    assert_eq!(run(input), expected);
}

#[test]
fn test_do_block_with_params() {
    let input = "5.times do |i|\nputs i\nend\n";
    assert_eq!(run(input), "5.times do |i|\n  puts i\nend\n");
}

#[test]
fn test_do_block_without_params() {
    let input = "loop do\nbreak\nend\n";
    assert_eq!(run(input), "loop do\n  break\nend\n");
}

#[test]
fn test_brace_block_with_params() {
    let input = "xs.each { |x|\np x\n}\n";
    assert_eq!(run(input), "xs.each { |x|\n  p x\n}\n");
}

#[test]
fn test_elsif_chain() {
    let input = "if a\nx\nelsif b\ny\nelse\nz\nend\n";
    let expected = "if a\n  x\nelsif b\n  y\nelse\n  z\nend\n";
    assert_eq!(run(input), expected);
}

#[test]
fn test_begin_ensure() {
    let input = "begin\nwork\nensure\ncleanup\nend\n";
    assert_eq!(run(input), "begin\n  work\nensure\n  cleanup\nend\n");
}

#[test]
fn test_rescue_line_opens_a_level() {
    // `rescue` is matched as a block keyword before the dual keywords
    let input = "begin\nwork\nrescue\nrecover\nend\nafter\n";
    let expected = "begin\n  work\n  rescue\n    recover\n  end\n  after\n";
    assert_eq!(run(input), expected);
}

#[test]
fn test_brackets_across_lines() {
    let input = "CONFIG = {\nname: 'x',\nlist: [\n1,\n2\n]\n}\n";
    let expected = "CONFIG = {\n  name: 'x',\n  list: [\n    1,\n    2\n  ]\n}\n";
    assert_eq!(run(input), expected);
}

#[test]
fn test_brackets_closed_on_same_line() {
    let input = "def f\n[1, 2].each(&:p)\n{ a: 1 }.keys\nend\n";
    let expected = "def f\n  [1, 2].each(&:p)\n  { a: 1 }.keys\nend\n";
    assert_eq!(run(input), expected);
}

#[test]
fn test_line_starting_with_open_bracket() {
    let input = "[\n1\n].sum\n";
    assert_eq!(run(input), "[\n  1\n].sum\n");
}

// ============================================================================
// Keywords are whole tokens
// ============================================================================

#[test]
fn test_keyword_prefixes_do_not_indent() {
    let input = "ifirit = 1\ndone = true\nclassify(x)\nending\nwhenever\n";
    assert_eq!(run(input), input);
}

#[test]
fn test_keyword_shapes() {
    assert_eq!(classify("def x\n"), Some(LineShape::IndentOpen));
    assert_eq!(classify("define_method(:x)\n"), Some(LineShape::Plain));
    assert_eq!(classify("end\n"), Some(LineShape::Outdent));
    assert_eq!(classify("endpoint\n"), Some(LineShape::Plain));
    assert_eq!(classify("when x\n"), Some(LineShape::Dual));
    assert_eq!(classify("when_ready\n"), Some(LineShape::Plain));
}

#[test]
fn test_hash_key_labels_do_not_indent() {
    let input = "link_to x,\nclass: 'btn'\nputs y\n";
    assert_eq!(run(input), input);
    let input = "validates :name,\nif: :active?,\nunless: :draft?\nsave\n";
    assert_eq!(run(input), input);
}

#[test]
fn test_keywords_only_count_at_line_start() {
    let input = "x = if y then 1 else 2 end\nputs x\n";
    assert_eq!(run(input), input);
}

// ============================================================================
// Literal regions
// ============================================================================

#[test]
fn test_interpolation_is_unchanged() {
    let input = "def f\nputs \"a #{if x then 1 else 2 end} b\"\nend\n";
    let expected = "def f\n  puts \"a #{if x then 1 else 2 end} b\"\nend\n";
    assert_eq!(run(input), expected);
}

#[test]
fn test_structure_inside_strings_is_ignored() {
    let input = "def f\nx = \"do |i|\"\ny = 'a ['\nz = \"{\" # [\nend\n";
    let expected = "def f\n  x = \"do |i|\"\n  y = 'a ['\n  z = \"{\" # [\nend\n";
    assert_eq!(run(input), expected);
}

#[test]
fn test_multiline_string_keeps_inner_lines() {
    let input = "def f\nx = \"line one\n    if inside\nend\"\nend\n";
    let expected = "def f\n  x = \"line one\n    if inside\nend\"\nend\n";
    assert_eq!(run(input), expected);
}

#[test]
fn test_comments_do_not_move_depth() {
    let input = "def f\n# end\nx # do |y|\nend\n";
    let expected = "def f\n  # end\n  x # do |y|\nend\n";
    assert_eq!(run(input), expected);
}

#[test]
fn test_heredoc_body_verbatim_and_terminator_realigned() {
    let input = "def query\nsql = <<~SQL\n  SELECT *\n  FROM t\n      SQL\nrun(sql)\nend\n";
    let expected =
        "def query\n  sql = <<~SQL\n  SELECT *\n  FROM t\n  SQL\n  run(sql)\nend\n";
    assert_eq!(run(input), expected);
}

#[test]
fn test_heredoc_with_trailing_arguments() {
    let input = "if a\ncall(<<-EOS, 1)\n  if this\nEOS\nend\n";
    let expected = "if a\n  call(<<-EOS, 1)\n  if this\n  EOS\nend\n";
    assert_eq!(run(input), expected);
}

#[test]
fn test_heredoc_label_inside_body_needs_whole_line() {
    let input = "x = <<EOS\nEOS is not alone here\nEOS\n";
    assert_eq!(run(input), input);
}

#[test]
fn test_two_heredocs_on_one_line() {
    // Only the first body is kept verbatim; the second reads as code
    let input = "def f\nfoo(<<A, <<B)\n  a\nA\nb\nB\nend\n";
    let expected = "def f\n  foo(<<A, <<B)\n  a\n  A\n  b\n  B\nend\n";
    assert_eq!(run(input), expected);
}

#[test]
fn test_heredoc_followed_by_block_opener() {
    let input = "def f\nexpect(<<~EOS) do |x|\n    body\nEOS\nx\nend\nend\n";
    let expected = "def f\n  expect(<<~EOS) do |x|\n    body\n  EOS\n    x\n  end\nend\n";
    assert_eq!(run(input), expected);
}

#[test]
fn test_shift_of_a_constant() {
    assert_eq!(run("def f\nlist <<ITEM\nend\n"), "def f\n  list <<ITEM\nend\n");
}

#[test]
fn test_consecutive_heredocs() {
    let input = "a = <<A\none\nA\nb = <<B\ntwo\nB\n";
    assert_eq!(run(input), input);
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_idempotent() {
    let input = "module M\nclass C\ndef f(xs)\nxs.map do |x|\n[\nx,\n\"#{x}\"\n]\nend\nend\nend\nend\n";
    let once = run(input);
    assert_eq!(run(&once), once);
}

#[test]
fn test_line_count_preserved() {
    let input = "class A\n\n  \ndef b\n\t\nend\nend\n";
    let output = run(input);
    assert_eq!(output.lines().count(), input.lines().count());
    assert_eq!(output, "class A\n\n\n  def b\n\n  end\nend\n");
}

#[test]
fn test_tab_unit() {
    let config = with_unit("\t");
    let out = reindent("class A\ndef b\nend\nend\n", &config).unwrap();
    assert_eq!(out, "class A\n\tdef b\n\tend\nend\n");
}

#[test]
fn test_balanced_document_ends_at_depth_zero() {
    let input = "class A\nif b\nc { |d|\ne\n}\nend\nend\n";
    let g = &*GRAMMAR;
    let mut state = ParserState::new(&g.grammar, input, Indenter::default());
    loop {
        let _ = state.apply(g.lexical.spacing);
        if state.is_at_end() {
            break;
        }
        assert!(state.apply(g.lines.line).is_some());
    }
    assert_eq!(state.context().depth(), 0);
    assert!(state.stats().memo_hits > 0);
}

#[test]
fn test_unmatched_closer_is_not_clamped() {
    let input = "end\nend\nif a\nx\nend\nif b\ny\nend\n";
    // Two openers are needed before anything is indented again
    assert_eq!(run(input), "end\nend\nif a\nx\nend\nif b\ny\nend\n");
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_empty_input_succeeds() {
    assert_eq!(run(""), "");
}

#[test]
fn test_missing_final_newline_is_an_error() {
    let err = reindent("class A\nend", &Config::default()).unwrap_err();
    assert_eq!(err.line, 2);
    assert_eq!(err.column, 4);
    assert_eq!(err.to_string(), "line 2, column 4: failed rule 'eol'");
    assert_eq!(err.caret(), "end\n   ^");
}

#[test]
fn test_heredoc_start_without_terminator_reads_as_code() {
    let input = "def f\nx = <<-EOS\nbody\nend\n";
    assert_eq!(run(input), "def f\n  x = <<-EOS\n  body\nend\n");
}

#[test]
fn test_invalid_directive_is_rejected() {
    let err = effective_config(&Config::default(), b"# rbeautify: --indent 0\nx\n", "zero.rb")
        .unwrap_err();
    assert!(err.to_string().contains("indent_unit must not be empty"), "{err}");
}

#[test]
fn test_no_partial_output_on_error() {
    let reader = BufReader::new(Cursor::new("def f\nx = 'open\nend\n"));
    let mut output = Vec::new();
    assert!(format_file(reader, &mut output, &Config::default(), "open.rb").is_err());
    assert!(output.is_empty());
}

// ============================================================================
// Configuration surfaces
// ============================================================================

#[test]
fn test_directive_overrides_unit() {
    let source = "# rbeautify: --indent 4\nif a\nb\nend\n";
    let mut config = Config::default();
    find_directive(&mut Cursor::new(source))
        .unwrap()
        .apply_to(&mut config, "test.rb");

    let reader = BufReader::new(Cursor::new(source));
    let mut output = Vec::new();
    format_file(reader, &mut output, &config, "test.rb").unwrap();
    assert_eq!(
        String::from_utf8(output).unwrap(),
        "# rbeautify: --indent 4\nif a\n    b\nend\n"
    );
}

#[test]
fn test_directive_disables_indent() {
    let source = "# rbeautify: --no-indent\nif a\nb\nend";
    let mut config = Config::default();
    find_directive(&mut Cursor::new(source))
        .unwrap()
        .apply_to(&mut config, "test.rb");
    assert_eq!(reindent(source, &config).unwrap(), source);
}

#[test]
fn test_changed_lines_reports_reindented_lines() {
    let input = "if a\nb\n  end\n";
    let output = run(input);
    let changes = changed_lines(input, &output);
    let lines: Vec<usize> = changes.iter().map(|c| c.line).collect();
    assert_eq!(lines, vec![2, 3]);
}
