//! Synthetic inputs shared by benches and stress tests.

/// Well-formed markup with a void element.
pub const BLOCK_TEMPLATE: &str = "<div class=box><span>hello</span><img src=x></div>";

/// Tag soup exercising every recovery path.
pub const SOUP_TEMPLATE: &str =
    "<p>one<p>two &amp; <b><i>three</b></i></x><tr><td>4<td>5</table><script>a<b</script>";

fn repeat(template: &str, blocks: usize) -> String {
    let mut html = String::with_capacity(template.len() * blocks);
    for _ in 0..blocks {
        html.push_str(template);
    }
    html
}

pub fn make_blocks(blocks: usize) -> String {
    repeat(BLOCK_TEMPLATE, blocks)
}

pub fn make_soup(blocks: usize) -> String {
    repeat(SOUP_TEMPLATE, blocks)
}

/// `depth` unclosed nested elements.
pub fn make_deep_nesting(depth: usize) -> String {
    repeat("<div>", depth)
}
