fn main() -> Result<(), Box<dyn std::error::Error>> {
    canto::runtime::run()
}
