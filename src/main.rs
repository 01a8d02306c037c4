fn main() -> std::process::ExitCode {
  lift_review_lib::run()
}
