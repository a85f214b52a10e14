pub mod check;
pub mod list;
pub mod play;
pub mod saves;

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}
