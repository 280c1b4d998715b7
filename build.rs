fn main() {
    println!("cargo:rerun-if-changed=config/zonewatch.json");

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
