use bpetok::Tokenizer;

const VOCAB: &str = r#"{"<|im_start|>": 1, "<|im_end|>": 2, "user": 3, "assistant": 5, "Ġhello": 10, "Ġworld": 11}"#;

const MERGES: &str = "#version: 0.2
Ġ h
Ġh e
Ġhe l
Ġhel l
Ġhell o
Ġ w
Ġw o
Ġwo r
Ġwor l
Ġworl d
u s
us e
use r
";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // pass `vocab.json merges.txt` to use a real model's files
    let args: Vec<String> = std::env::args().skip(1).collect();
    let loaded = match args.as_slice() {
        [vocab, merges, ..] => Tokenizer::from_files(vocab, merges),
        _ => Tokenizer::from_resources(VOCAB, MERGES),
    };
    let tokenizer = match loaded {
        Ok(t) => t,
        Err(e) => {
            eprintln!("failed to load tokenizer: {e}");
            std::process::exit(1);
        }
    };

    let prompt = " hello world";
    let ids = tokenizer.encode(prompt, true);

    println!("prompt:   {prompt:?}");
    println!("symbols:  {:?} (unwrapped)", tokenizer.tokenize(prompt));
    println!("ids:      {ids:?}");
    println!("decoded:  {:?}", tokenizer.decode(&ids));
    println!(
        "bos/eos:  {}/{}",
        tokenizer.bos_token_id(),
        tokenizer.eos_token_id()
    );
}
