fn main() {
    doc_summary_lib::run()
}
