fn main() {
    tally::cli::run();
}
