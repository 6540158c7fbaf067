use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "record-validator")]
#[command(about = "AIレコード検証・トリアージツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// レコードJSONを検証して結果を出力
    Validate {
        /// レコード配列のJSONファイル
        #[arg(required = true)]
        input: PathBuf,

        /// 補助ルールを参照して検証（Expert Mode）
        #[arg(long)]
        rag: bool,

        /// 出力JSONファイル（デフォルト: <入力>.result.json）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// デモ用データで検証
    Demo {
        /// 補助ルールを参照して検証（Expert Mode）
        #[arg(long)]
        rag: bool,

        /// 出力JSONファイル
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 検証後、対話的に結果をレビュー
    Review {
        /// レコード配列のJSONファイル
        #[arg(required = true)]
        input: PathBuf,

        /// 補助ルールを参照して検証（Expert Mode）
        #[arg(long)]
        rag: bool,

        /// 出力JSONファイル（デフォルト: <入力>.result.json）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 設定を表示/編集
    Config {
        /// APIのベースURLを設定
        #[arg(long)]
        set_api_url: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
